//! dynarray - a growable array with fail-fast cursors
//!
//! # Overview
//!
//! [`DynArray<T>`] is a resizable, index-addressable sequence stored in one
//! contiguous buffer:
//!
//! - Occupied slots always form the prefix `[0, len)` of the buffer.
//! - When an insertion needs one more slot than available, the buffer is
//!   reallocated with capacity `old + old / 2 + 1` (about 1.5x, and never stuck
//!   at zero). Capacity never shrinks on its own.
//! - Insertion and removal in the middle shift the tail by one slot.
//! - Every fallible operation validates first, so an `Err` leaves the array
//!   untouched.
//!
//! # Cursors
//!
//! Each structural change (`push`, `insert`, `remove`, a non-empty `clear`)
//! bumps the array's version. A [`Cursor`] captures that version when created
//! and checks it on every step, so a traversal interrupted by a structural
//! edit from elsewhere fails with [`Error::ConcurrentStructuralChange`]
//! instead of silently skipping or repeating elements. Removing through the
//! cursor itself is allowed:
//!
//! ```
//! use dynarray::{DynArray, Error};
//!
//! let mut array = DynArray::new();
//! array.push(10);
//! array.push(20);
//!
//! let mut cursor = array.cursor();
//! assert_eq!(cursor.next(&array), Ok(&10));
//!
//! array.push(30);
//! assert_eq!(cursor.next(&array), Err(Error::ConcurrentStructuralChange));
//! ```
//!
//! For ordinary read-only traversal use [`DynArray::iter`], which borrows the
//! array and needs no checks.
//!
//! # Threading
//!
//! The array is a plain single-owner value. The version check is a diagnostic
//! for same-thread misuse, not a synchronisation mechanism.

#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

// This works on std and no_std and is harmless.
extern crate alloc;

mod array;
mod cursor;
mod error;
mod iter;

pub use array::{CAPACITY_MARGIN, DEFAULT_CAPACITY, DynArray, MAX_CAPACITY};
pub use cursor::Cursor;
pub use error::{Error, Result};
pub use iter::Iter;


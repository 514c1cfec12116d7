//! Error type shared by the container and its cursors.
//!
//! Every failure is reported before anything is mutated, so an `Err` always
//! means the container is exactly as it was before the call.

use thiserror::Error;

/// Errors returned by [`DynArray`](crate::DynArray) and [`Cursor`](crate::Cursor).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The requested initial capacity is larger than the container can ever hold.
    #[error("invalid capacity {capacity}: must be at most {max}")]
    InvalidCapacity { capacity: usize, max: usize },

    /// An index was outside the valid range of the operation.
    ///
    /// `len` is the container length at the time of the call. Reads, `set`
    /// and `remove` accept `0..len`; `insert` accepts `0..=len`.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The cursor has no element left to yield.
    #[error("no more elements")]
    NoMoreElements,

    /// The container was structurally modified behind the cursor's back, or
    /// the cursor belongs to a different container.
    ///
    /// The cursor cannot recover from this; create a new one.
    #[error("container was structurally modified during iteration")]
    ConcurrentStructuralChange,

    /// `remove_current` was called without an element returned by `next`
    /// that has not already been removed.
    #[error("no element to remove")]
    IllegalIteratorState,
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

//! Fail-fast cursor over a [`DynArray`].
//!
//! A [`Cursor`] is a detached traversal handle: it remembers a position and
//! the stamp (owner and version) of the array it was created from, and is
//! handed the array on every call. Because it holds no reference, the array
//! can be mutated between calls. Such a mutation is detected by comparing
//! stamps, and the cursor refuses to continue.
//!
//! The one structural change a cursor survives is its own
//! [`remove_current`](Cursor::remove_current), after which it re-captures the
//! array's new version.
//!
//! ```
//! use dynarray::DynArray;
//!
//! let mut array = DynArray::new();
//! for i in 1..=5 {
//!     array.push(i);
//! }
//!
//! let mut cursor = array.cursor();
//! while cursor.has_next(&array) {
//!     if cursor.next(&array)? % 2 == 0 {
//!         cursor.remove_current(&mut array)?;
//!     }
//! }
//! assert_eq!(array, [1, 3, 5]);
//! # Ok::<(), dynarray::Error>(())
//! ```

use crate::{
    array::{ArrayId, DynArray},
    error::{Error, Result},
};

/// Which array a cursor belongs to, and which version of it it last saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Stamp {
    pub(crate) owner: ArrayId,
    pub(crate) version: u64,
}

/// A fail-fast traversal handle created by [`DynArray::cursor`].
#[derive(Debug, Clone)]
pub struct Cursor {
    /// Index of the next element `next` will yield.
    position: usize,
    /// Index of the element most recently yielded and not yet removed.
    last_returned: Option<usize>,
    expected: Stamp,
}

impl Cursor {
    pub(crate) fn new(expected: Stamp) -> Self {
        Self {
            position: 0,
            last_returned: None,
            expected,
        }
    }

    /// Index of the element the next call to [`Cursor::next`] would yield.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether the position is not at the current end of `array`.
    ///
    /// A plain query: it never moves the cursor and never checks for
    /// concurrent modification.
    pub fn has_next<T>(&self, array: &DynArray<T>) -> bool {
        self.position != array.len()
    }

    /// Yields the element at the current position and advances past it.
    ///
    /// Fails with [`Error::ConcurrentStructuralChange`] if `array` changed
    /// structurally since this cursor last synchronised with it (or is not
    /// the array it was created from), and with [`Error::NoMoreElements`] at
    /// the end.
    pub fn next<'a, T>(&mut self, array: &'a DynArray<T>) -> Result<&'a T> {
        self.check_for_comodification(array)?;
        let index = self.position;
        if index >= array.len() {
            return Err(Error::NoMoreElements);
        }
        let value = array
            .get(index)
            .map_err(|_| Error::ConcurrentStructuralChange)?;
        self.position = index + 1;
        self.last_returned = Some(index);
        Ok(value)
    }

    /// Removes the element most recently yielded by [`Cursor::next`] and
    /// returns it.
    ///
    /// The following `next` yields the element that slid into its place.
    /// Fails with [`Error::IllegalIteratorState`] when there is no such
    /// element (nothing yielded yet, or already removed), then with
    /// [`Error::ConcurrentStructuralChange`] under the same rule as `next`.
    pub fn remove_current<T>(&mut self, array: &mut DynArray<T>) -> Result<T> {
        let Some(index) = self.last_returned else {
            return Err(Error::IllegalIteratorState);
        };
        self.check_for_comodification(array)?;
        let value = array
            .remove(index)
            .map_err(|_| Error::ConcurrentStructuralChange)?;
        self.position = index;
        self.last_returned = None;
        self.expected = array.stamp();
        Ok(value)
    }

    fn check_for_comodification<T>(&self, array: &DynArray<T>) -> Result<()> {
        if array.stamp() == self.expected {
            Ok(())
        } else {
            Err(Error::ConcurrentStructuralChange)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cursor_state() {
        let array = DynArray::<i32>::new();
        let cursor = array.cursor();
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.last_returned, None);
        assert_eq!(cursor.expected, array.stamp());
    }

    #[test]
    fn test_remove_current_resynchronises() {
        let mut array = DynArray::new();
        array.push('a');
        array.push('b');

        let mut cursor = array.cursor();
        assert_eq!(cursor.next(&array), Ok(&'a'));
        assert_eq!(cursor.last_returned, Some(0));
        assert_eq!(cursor.remove_current(&mut array), Ok('a'));

        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.last_returned, None);
        assert_eq!(cursor.expected.version, 3);
        assert_eq!(cursor.expected, array.stamp());
    }

    #[test]
    fn test_cursor_of_clone_is_foreign() {
        let mut array = DynArray::new();
        array.push(1);
        let copy = array.clone();

        let mut cursor = array.cursor();
        assert_eq!(cursor.next(&copy), Err(Error::ConcurrentStructuralChange));
        assert_eq!(cursor.position(), 0);
    }
}

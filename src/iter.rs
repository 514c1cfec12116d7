use core::{iter::FusedIterator, slice};

/// Borrowing iterator over a [`DynArray`](crate::DynArray), created by
/// [`DynArray::iter`](crate::DynArray::iter).
///
/// The array cannot change while this is alive, so unlike
/// [`Cursor`](crate::Cursor) it needs no modification check.
#[derive(Debug, Clone)]
pub struct Iter<'a, T> {
    inner: slice::Iter<'a, T>,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(slice: &'a [T]) -> Self {
        Self {
            inner: slice.iter(),
        }
    }

    /// The elements not yet yielded.
    pub fn as_slice(&self) -> &'a [T] {
        self.inner.as_slice()
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

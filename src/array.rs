//! The growable array itself.
//!
//! Occupied slots always form the prefix `[0, len)` of the buffer. Every
//! structural mutation (`push`, `insert`, `remove`, a non-empty `clear`) bumps
//! `version` exactly once; `set` and the read operations never do.

use core::{
    fmt,
    mem,
    num::NonZeroUsize,
    ops::Index,
    sync::atomic::{AtomicUsize, Ordering},
};

use alloc::vec::Vec;
use dynarray_raw_buffer::RawBuffer;

use crate::{
    cursor::{Cursor, Stamp},
    error::{Error, Result},
    iter::Iter,
};

/// Capacity used by [`DynArray::new`].
pub const DEFAULT_CAPACITY: usize = 10;

/// Headroom kept below the largest representable size so growth arithmetic
/// never has to deal with the very top of the range.
pub const CAPACITY_MARGIN: usize = 8;

/// Largest capacity a [`DynArray`] may ever reach.
pub const MAX_CAPACITY: usize = isize::MAX as usize - CAPACITY_MARGIN;

/// Identity of one container, used to tell cursors of different containers apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ArrayId(NonZeroUsize);

impl ArrayId {
    fn next() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(1);
        let id = NEXT.fetch_add(1, Ordering::Relaxed);
        // Zero is only reachable after wrapping around the whole id space.
        Self(NonZeroUsize::new(id).unwrap_or(NonZeroUsize::MIN))
    }
}

/// Largest capacity whose buffer of `T` can still be laid out in memory.
pub(crate) fn capacity_limit<T>() -> usize {
    let size = mem::size_of::<T>();
    if size == 0 {
        return MAX_CAPACITY;
    }
    let max_bytes = isize::MAX as usize - (mem::align_of::<T>() - 1);
    MAX_CAPACITY.min(max_bytes / size)
}

/// Capacity that follows `old_cap` in the growth sequence:
/// `old + old / 2 + 1`, clamped to `limit`.
pub(crate) fn grown_capacity(old_cap: usize, limit: usize) -> usize {
    match old_cap.checked_add(old_cap / 2 + 1) {
        Some(new_cap) if new_cap <= limit => new_cap,
        _ => limit,
    }
}

/// A resizable, index-addressable sequence backed by one contiguous buffer.
///
/// Grows by roughly 1.5x (see [`DynArray::capacity`]) and never shrinks on
/// its own. Structural changes are counted so that a [`Cursor`] can notice
/// when the array changed under it.
///
/// ```
/// use dynarray::DynArray;
///
/// let mut array = DynArray::new();
/// array.push("b");
/// array.insert(0, "a").unwrap();
/// assert_eq!(array.get(0), Ok(&"a"));
/// assert_eq!(array.remove(1), Ok("b"));
/// assert_eq!(array.len(), 1);
/// ```
pub struct DynArray<T> {
    buf: RawBuffer<T>,
    len: usize,
    version: u64,
    id: ArrayId,
}

impl<T> DynArray<T> {
    /// Creates an empty array with room for [`DEFAULT_CAPACITY`] elements.
    pub fn new() -> Self {
        let buf = match RawBuffer::with_capacity(DEFAULT_CAPACITY) {
            Ok(buf) => buf,
            // Only a type so large that ten of them overflow `isize` gets here.
            Err(_) => capacity_overflow(),
        };
        Self::from_buffer(buf)
    }

    /// Creates an empty array with room for exactly `capacity` elements.
    ///
    /// Fails with [`Error::InvalidCapacity`] when `capacity` exceeds
    /// [`MAX_CAPACITY`] or `capacity` elements of `T` cannot be allocated as
    /// one block.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let invalid = Error::InvalidCapacity {
            capacity,
            max: MAX_CAPACITY,
        };
        if capacity > MAX_CAPACITY {
            return Err(invalid);
        }
        let buf = RawBuffer::with_capacity(capacity).map_err(|_| invalid)?;
        Ok(Self::from_buffer(buf))
    }

    fn from_buffer(buf: RawBuffer<T>) -> Self {
        Self {
            buf,
            len: 0,
            version: 0,
            id: ArrayId::next(),
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the backing buffer, occupied or not.
    ///
    /// Starting from capacity `c`, each growth replaces it with
    /// `c + c / 2 + 1`, so a zero-capacity array grows to 1, then 2, 4, 7...
    /// Growth stops at [`MAX_CAPACITY`], or earlier for element types so
    /// large that fewer slots already fill the address space.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Number of structural mutations performed so far.
    #[inline(always)]
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn stamp(&self) -> Stamp {
        Stamp {
            owner: self.id,
            version: self.version,
        }
    }

    /// Appends `value` at the end. Always succeeds and returns `true`.
    pub fn push(&mut self, value: T) -> bool {
        let index = self.len;
        self.insert_unchecked(index, value);
        true
    }

    /// Inserts `value` at `index`, shifting `[index, len)` one slot right.
    ///
    /// Accepts `0 <= index <= len`; anything else fails with
    /// [`Error::IndexOutOfRange`] and leaves the array untouched.
    pub fn insert(&mut self, index: usize, value: T) -> Result<()> {
        if index > self.len {
            return Err(self.out_of_range(index));
        }
        self.insert_unchecked(index, value);
        Ok(())
    }

    fn insert_unchecked(&mut self, index: usize, value: T) {
        debug_assert!(index <= self.len);
        if self.len == self.capacity() {
            self.grow();
        }
        // SAFETY: `index <= len < capacity` after growing, and `[0, len)` is
        // initialised. The shift leaves slot `index` empty for the write.
        unsafe {
            if index < self.len {
                self.buf.shift_right(index, self.len);
            }
            self.buf.write(index, value);
        }
        self.len += 1;
        self.version += 1;
    }

    #[cold]
    fn grow(&mut self) {
        let old_cap = self.capacity();
        let new_cap = grown_capacity(old_cap, capacity_limit::<T>());
        if new_cap <= old_cap {
            capacity_overflow();
        }
        tracing::debug!(
            old_capacity = old_cap,
            new_capacity = new_cap,
            len = self.len,
            "Growing array buffer"
        );
        // SAFETY: `len <= old_cap < new_cap` and `[0, len)` is initialised.
        if unsafe { self.buf.reallocate(new_cap, self.len) }.is_err() {
            capacity_overflow();
        }
    }

    /// Returns a reference to the element at `index` (`0 <= index < len`).
    pub fn get(&self, index: usize) -> Result<&T> {
        self.check_index(index)?;
        // SAFETY: `index < len`, so the slot is initialised.
        Ok(unsafe { self.buf.get(index) })
    }

    /// Replaces the element at `index` and returns the previous one.
    ///
    /// This is not a structural change: the version stays the same and
    /// outstanding cursors remain valid.
    pub fn set(&mut self, index: usize, value: T) -> Result<T> {
        self.check_index(index)?;
        // SAFETY: `index < len`, so the slot is initialised.
        let slot = unsafe { self.buf.get_mut(index) };
        Ok(mem::replace(slot, value))
    }

    /// Removes and returns the element at `index`, shifting `(index, len)`
    /// one slot left.
    pub fn remove(&mut self, index: usize) -> Result<T> {
        self.check_index(index)?;
        // SAFETY: `index < len`. The value is moved out before the shift
        // overwrites its slot, and slot `len - 1` is forgotten by the
        // decrement below.
        let value = unsafe {
            let value = self.buf.read(index);
            self.buf.shift_left(index, self.len);
            value
        };
        self.len -= 1;
        self.version += 1;
        Ok(value)
    }

    /// Drops every element. The capacity is kept.
    ///
    /// Clearing an already empty array does nothing at all, including not
    /// bumping the version.
    pub fn clear(&mut self) {
        if self.len == 0 {
            return;
        }
        let len = mem::replace(&mut self.len, 0);
        self.version += 1;
        tracing::trace!(dropped = len, capacity = self.capacity(), "Clearing array");
        // `len` is already zero, so a panicking destructor can only leak.
        // SAFETY: `[0, len)` was initialised and is no longer reachable.
        unsafe { self.buf.drop_prefix(len) }
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `[0, len)` is initialised.
        unsafe { self.buf.as_slice(self.len) }
    }

    /// Returns a borrowing iterator. The borrow checker keeps the array
    /// frozen while it is alive.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self.as_slice())
    }

    /// Returns a fail-fast cursor positioned before the first element.
    ///
    /// The cursor does not borrow the array; it is handed the array on every
    /// call and reports [`Error::ConcurrentStructuralChange`] if the array was
    /// structurally modified other than through the cursor itself.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.stamp())
    }

    #[inline]
    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.len {
            Ok(())
        } else {
            Err(self.out_of_range(index))
        }
    }

    fn out_of_range(&self, index: usize) -> Error {
        Error::IndexOutOfRange {
            index,
            len: self.len,
        }
    }
}

#[cold]
#[inline(never)]
fn capacity_overflow() -> ! {
    panic!("capacity overflow")
}

impl<T> Default for DynArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for DynArray<T> {
    fn drop(&mut self) {
        let len = mem::replace(&mut self.len, 0);
        // SAFETY: `[0, len)` is initialised and never touched again.
        unsafe { self.buf.drop_prefix(len) }
    }
}

impl<T: Clone> Clone for DynArray<T> {
    fn clone(&self) -> Self {
        let mut buf = match RawBuffer::with_capacity(self.capacity()) {
            Ok(buf) => buf,
            Err(_) => capacity_overflow(),
        };
        for (i, value) in self.iter().enumerate() {
            // SAFETY: `i < len <= capacity`, and the slot is empty.
            unsafe { buf.write(i, value.clone()) };
        }
        Self {
            buf,
            len: self.len,
            version: 0,
            id: ArrayId::next(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for DynArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Index<usize> for DynArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T> AsRef<[T]> for DynArray<T> {
    fn as_ref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<'a, T> IntoIterator for &'a DynArray<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq<U>, U> PartialEq<DynArray<U>> for DynArray<T> {
    fn eq(&self, other: &DynArray<U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for DynArray<T> {}

impl<T: PartialEq<U>, U> PartialEq<[U]> for DynArray<T> {
    fn eq(&self, other: &[U]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq<U>, U, const N: usize> PartialEq<[U; N]> for DynArray<T> {
    fn eq(&self, other: &[U; N]) -> bool {
        self.as_slice() == other
    }
}

impl<T: PartialEq<U>, U> PartialEq<Vec<U>> for DynArray<T> {
    fn eq(&self, other: &Vec<U>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

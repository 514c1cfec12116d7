#![allow(unsafe_code)]
#![no_std]

//! RawBuffer: an owned, fixed-capacity block of contiguous slots.
//!
//! `RawBuffer<T>` is the storage half of a growable array. It owns one heap
//! allocation of `capacity` slots and nothing else:
//! - It does not track how many slots are occupied; the owner does.
//! - It never drops elements; the owner drops the occupied prefix before the
//!   buffer itself goes away.
//! - Reallocation always moves into a brand-new allocation and frees the old
//!   one, so the copy count is exactly the occupied prefix handed in.
//!
//! Zero-sized element types never allocate, but the capacity is still
//! recorded so callers can reason about it.
//!
//! ```text
//! RawBuffer<T>:  ptr ──▶ [T | T | T | _ | _ | _]
//!                        └── occupied ─┘└ empty ┘
//!                        (the owner decides where the split is)
//! ```

extern crate alloc;

use alloc::alloc::{Layout, LayoutError, alloc, dealloc, handle_alloc_error};
use core::{
    fmt,
    marker::PhantomData,
    mem,
    ptr::{self, NonNull},
    slice,
};

/// Owned storage for `capacity` slots of `T`.
///
/// All slot accessors are `unsafe`: the caller is responsible for knowing
/// which slots are initialised.
pub struct RawBuffer<T> {
    ptr: NonNull<T>,
    cap: usize,
    _marker: PhantomData<T>,
}

#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
static_assertions::assert_eq_size!(RawBuffer<u64>, [usize; 2]);
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
static_assertions::assert_eq_size!(RawBuffer<()>, [usize; 2]);

// The buffer owns its slots exactly like a `Box<[T]>` would.
unsafe impl<T: Send> Send for RawBuffer<T> {}
unsafe impl<T: Sync> Sync for RawBuffer<T> {}

/// Allocates memory for `layout`, or hands out a dangling pointer when no
/// memory is needed.
fn allocate<T>(layout: Layout) -> NonNull<T> {
    if layout.size() == 0 {
        return NonNull::dangling();
    }
    // SAFETY: `layout` has a non-zero size.
    let ptr = unsafe { alloc(layout) };
    let Some(ptr) = NonNull::new(ptr) else {
        handle_alloc_error(layout)
    };
    ptr.cast()
}

impl<T> RawBuffer<T> {
    /// Allocates a buffer of exactly `cap` slots.
    ///
    /// Fails if `cap` slots of `T` do not fit in a valid [`Layout`].
    pub fn with_capacity(cap: usize) -> Result<Self, LayoutError> {
        let layout = Layout::array::<T>(cap)?;
        Ok(Self {
            ptr: allocate(layout),
            cap,
            _marker: PhantomData,
        })
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Moves the first `len` slots into a new allocation of `new_cap` slots
    /// and frees the old allocation.
    ///
    /// On error nothing has changed.
    ///
    /// # Safety
    ///
    /// - `len <= self.capacity()` and `len <= new_cap`.
    /// - The first `len` slots are initialised.
    pub unsafe fn reallocate(&mut self, new_cap: usize, len: usize) -> Result<(), LayoutError> {
        debug_assert!(len <= self.cap);
        debug_assert!(len <= new_cap);

        let new_layout = Layout::array::<T>(new_cap)?;
        let new_ptr = allocate::<T>(new_layout);

        // SAFETY: both allocations hold at least `len` slots and are distinct.
        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), len);
        }

        // SAFETY: the live values were moved out above, the old slots are
        // no longer referenced.
        unsafe {
            self.release();
        }
        self.ptr = new_ptr;
        self.cap = new_cap;
        Ok(())
    }

    /// Writes `value` into slot `index` without reading the old contents.
    ///
    /// # Safety
    ///
    /// `index < self.capacity()`. Whatever was in the slot is overwritten
    /// without being dropped.
    #[inline]
    pub unsafe fn write(&mut self, index: usize, value: T) {
        debug_assert!(index < self.cap);
        // SAFETY: in bounds per the caller's contract.
        unsafe { self.ptr.as_ptr().add(index).write(value) }
    }

    /// Moves the value out of slot `index`, leaving the slot logically empty.
    ///
    /// # Safety
    ///
    /// `index < self.capacity()` and the slot is initialised. The caller must
    /// treat the slot as empty afterwards.
    #[inline]
    pub unsafe fn read(&self, index: usize) -> T {
        debug_assert!(index < self.cap);
        // SAFETY: in bounds and initialised per the caller's contract.
        unsafe { self.ptr.as_ptr().add(index).read() }
    }

    /// # Safety
    ///
    /// `index < self.capacity()` and the slot is initialised.
    #[inline]
    pub unsafe fn get(&self, index: usize) -> &T {
        debug_assert!(index < self.cap);
        // SAFETY: in bounds and initialised per the caller's contract.
        unsafe { &*self.ptr.as_ptr().add(index) }
    }

    /// # Safety
    ///
    /// `index < self.capacity()` and the slot is initialised.
    #[inline]
    pub unsafe fn get_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.cap);
        // SAFETY: in bounds and initialised per the caller's contract.
        unsafe { &mut *self.ptr.as_ptr().add(index) }
    }

    /// Shifts slots `[index, len)` one position to the right, leaving slot
    /// `index` logically empty.
    ///
    /// # Safety
    ///
    /// `index <= len < self.capacity()` and slots `[index, len)` are
    /// initialised.
    pub unsafe fn shift_right(&mut self, index: usize, len: usize) {
        debug_assert!(index <= len);
        debug_assert!(len < self.cap);
        let base = self.ptr.as_ptr();
        // SAFETY: source `[index, len)` and destination `[index + 1, len + 1)`
        // are both within capacity. `ptr::copy` handles the overlap.
        unsafe {
            ptr::copy(base.add(index), base.add(index + 1), len - index);
        }
    }

    /// Shifts slots `(index, len)` one position to the left, overwriting slot
    /// `index` and leaving slot `len - 1` logically empty.
    ///
    /// # Safety
    ///
    /// `index < len <= self.capacity()`, slots `(index, len)` are initialised
    /// and the value in slot `index` has already been moved out.
    pub unsafe fn shift_left(&mut self, index: usize, len: usize) {
        debug_assert!(index < len);
        debug_assert!(len <= self.cap);
        let base = self.ptr.as_ptr();
        // SAFETY: source `[index + 1, len)` and destination `[index, len - 1)`
        // are both within capacity. `ptr::copy` handles the overlap.
        unsafe {
            ptr::copy(base.add(index + 1), base.add(index), len - index - 1);
        }
    }

    /// # Safety
    ///
    /// `len <= self.capacity()` and the first `len` slots are initialised.
    #[inline]
    pub unsafe fn as_slice(&self, len: usize) -> &[T] {
        debug_assert!(len <= self.cap);
        // SAFETY: the pointer is aligned and non-null, the prefix is
        // initialised per the caller's contract.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), len) }
    }

    /// # Safety
    ///
    /// `len <= self.capacity()` and the first `len` slots are initialised.
    #[inline]
    pub unsafe fn as_mut_slice(&mut self, len: usize) -> &mut [T] {
        debug_assert!(len <= self.cap);
        // SAFETY: as for `as_slice`, and `&mut self` gives exclusive access.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), len) }
    }

    /// Drops the values in the first `len` slots in place. The slots are
    /// logically empty afterwards.
    ///
    /// # Safety
    ///
    /// `len <= self.capacity()` and the first `len` slots are initialised.
    pub unsafe fn drop_prefix(&mut self, len: usize) {
        // SAFETY: forwarded from the caller.
        let occupied: *mut [T] = unsafe { self.as_mut_slice(len) };
        // SAFETY: the values are initialised and nobody else references them.
        unsafe { ptr::drop_in_place(occupied) }
    }

    /// Frees the allocation without touching any slot.
    ///
    /// # Safety
    ///
    /// No slot is read afterwards until `ptr` and `cap` are replaced.
    unsafe fn release(&mut self) {
        let size = mem::size_of::<T>() * self.cap;
        if size == 0 {
            return;
        }
        // SAFETY: the same size and alignment were validated by
        // `Layout::array::<T>(self.cap)` when this allocation was made.
        unsafe {
            let layout = Layout::from_size_align_unchecked(size, mem::align_of::<T>());
            dealloc(self.ptr.as_ptr().cast(), layout);
        }
    }
}

impl<T> fmt::Debug for RawBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBuffer")
            .field("capacity", &self.cap)
            .finish_non_exhaustive()
    }
}

impl<T> Drop for RawBuffer<T> {
    fn drop(&mut self) {
        // Elements are the owner's business. Only the memory goes here.
        // SAFETY: the buffer is never used again.
        unsafe { self.release() }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use alloc::rc::Rc;
    use alloc::vec::Vec;

    fn filled(cap: usize, values: &[i32]) -> RawBuffer<i32> {
        let mut buf = RawBuffer::with_capacity(cap).unwrap();
        for (i, v) in values.iter().enumerate() {
            unsafe { buf.write(i, *v) };
        }
        buf
    }

    #[test]
    fn test_with_capacity() {
        let buf = RawBuffer::<u64>::with_capacity(10).unwrap();
        assert_eq!(buf.capacity(), 10);

        let buf = RawBuffer::<u64>::with_capacity(0).unwrap();
        assert_eq!(buf.capacity(), 0);
    }

    #[test]
    fn test_with_capacity_layout_overflow() {
        assert!(RawBuffer::<u64>::with_capacity(usize::MAX).is_err());
        assert!(RawBuffer::<u8>::with_capacity(isize::MAX as usize + 1).is_err());
    }

    #[test]
    fn test_write_read() {
        let mut buf = filled(4, &[1, 2, 3]);
        unsafe {
            assert_eq!(buf.as_slice(3), &[1, 2, 3]);
            assert_eq!(*buf.get(1), 2);
            *buf.get_mut(1) = 20;
            assert_eq!(buf.read(1), 20);
        }
    }

    #[test]
    fn test_reallocate_preserves_prefix() {
        let mut buf = filled(3, &[7, 8, 9]);
        unsafe { buf.reallocate(5, 3).unwrap() };
        assert_eq!(buf.capacity(), 5);
        unsafe {
            buf.write(3, 10);
            assert_eq!(buf.as_slice(4), &[7, 8, 9, 10]);
        }
    }

    #[test]
    fn test_reallocate_from_zero() {
        let mut buf = RawBuffer::<i32>::with_capacity(0).unwrap();
        unsafe { buf.reallocate(1, 0).unwrap() };
        assert_eq!(buf.capacity(), 1);
        unsafe {
            buf.write(0, 42);
            assert_eq!(buf.as_slice(1), &[42]);
        }
    }

    #[test]
    fn test_reallocate_layout_overflow_keeps_buffer() {
        let mut buf = filled(2, &[1, 2]);
        assert!(unsafe { buf.reallocate(usize::MAX, 2) }.is_err());
        assert_eq!(buf.capacity(), 2);
        assert_eq!(unsafe { buf.as_slice(2) }, &[1, 2]);
    }

    #[test]
    fn test_shift_right() {
        let mut buf = filled(5, &[1, 2, 3, 4]);
        unsafe {
            buf.shift_right(1, 4);
            buf.write(1, 99);
            assert_eq!(buf.as_slice(5), &[1, 99, 2, 3, 4]);
        }
    }

    #[test]
    fn test_shift_right_at_end_is_noop() {
        let mut buf = filled(3, &[1, 2]);
        unsafe {
            buf.shift_right(2, 2);
            buf.write(2, 3);
            assert_eq!(buf.as_slice(3), &[1, 2, 3]);
        }
    }

    #[test]
    fn test_shift_left() {
        let mut buf = filled(5, &[1, 2, 3, 4, 5]);
        unsafe {
            assert_eq!(buf.read(2), 3);
            buf.shift_left(2, 5);
            assert_eq!(buf.as_slice(4), &[1, 2, 4, 5]);
        }
    }

    #[test]
    fn test_shift_left_last() {
        let mut buf = filled(3, &[1, 2, 3]);
        unsafe {
            assert_eq!(buf.read(2), 3);
            buf.shift_left(2, 3);
            assert_eq!(buf.as_slice(2), &[1, 2]);
        }
    }

    #[test]
    fn test_drop_prefix() {
        let counter = Rc::new(());
        let mut buf = RawBuffer::with_capacity(4).unwrap();
        for i in 0..3 {
            unsafe { buf.write(i, Rc::clone(&counter)) };
        }
        assert_eq!(Rc::strong_count(&counter), 4);
        unsafe { buf.drop_prefix(3) };
        assert_eq!(Rc::strong_count(&counter), 1);
    }

    #[test]
    fn test_zero_sized() {
        let mut buf = RawBuffer::<()>::with_capacity(3).unwrap();
        assert_eq!(buf.capacity(), 3);
        unsafe {
            buf.write(0, ());
            buf.reallocate(100, 1).unwrap();
        }
        assert_eq!(buf.capacity(), 100);
        assert_eq!(unsafe { buf.as_slice(1) }, &[()]);
    }

    #[test]
    fn test_heap_values_survive_reallocation() {
        let mut buf = RawBuffer::<Vec<i32>>::with_capacity(1).unwrap();
        unsafe {
            buf.write(0, alloc::vec![1, 2, 3]);
            buf.reallocate(2, 1).unwrap();
            buf.write(1, alloc::vec![4]);
            assert_eq!(buf.as_slice(2), &[alloc::vec![1, 2, 3], alloc::vec![4]]);
            buf.drop_prefix(2);
        }
    }
}

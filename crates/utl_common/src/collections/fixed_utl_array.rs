use core::{
    mem::MaybeUninit,
    ptr::{self, NonNull},
};

use super::{ArrayError, imp::utl_array::{ArrayBuffer, GenericUtlArray, InitBuffer}};

/// Inline storage for exactly `N` elements, it never allocates and never moves while the owner stays in place.
pub struct FixedBuffer<T, const N: usize> {
    buf: MaybeUninit<[T; N]>,
}

impl<T, const N: usize> FixedBuffer<T, N> {
    pub const fn new() -> Self {
        Self { buf: MaybeUninit::uninit() }
    }

    fn exceeded(required: usize) -> ArrayError {
        ArrayError::CapacityExceeded { capacity: N, required }
    }
}

unsafe impl<T, const N: usize> ArrayBuffer<T> for FixedBuffer<T, N> {
    const CONTIGUOUS: bool = true;

    fn capacity(&self) -> usize {
        N
    }

    fn grow_size(&self) -> usize {
        0
    }

    fn set_grow_size(&mut self, _grow_size: usize) {
    }

    fn try_grow(&mut self, num: usize) -> Result<usize, ArrayError> {
        Err(Self::exceeded(N.saturating_add(num)))
    }

    fn try_ensure_capacity(&mut self, capacity: usize) -> Result<usize, ArrayError> {
        if capacity <= N {
            Ok(N)
        } else {
            Err(Self::exceeded(capacity))
        }
    }

    fn purge(&mut self) {
    }

    fn purge_to(&mut self, _keep: usize) {
    }

    fn base(&self) -> Option<NonNull<T>> {
        NonNull::new(self.buf.as_ptr() as *mut T)
    }

    unsafe fn slot(&self, index: usize) -> *const T {
        (self.buf.as_ptr() as *const T).add(index)
    }

    unsafe fn slot_mut(&mut self, index: usize) -> *mut T {
        (self.buf.as_mut_ptr() as *mut T).add(index)
    }

    unsafe fn relocate(&mut self, src: usize, dst: usize, count: usize) {
        if count > 0 && src != dst {
            let base = self.buf.as_mut_ptr() as *mut T;
            ptr::copy(base.add(src), base.add(dst), count);
        }
    }
}

impl<T, const N: usize> InitBuffer<T> for FixedBuffer<T, N> {
    fn with_grow_size(_grow_size: usize) -> Self {
        Self::new()
    }
}

//------------------------------------------------------------------------------------------------------------------------------

/// Array that stores at most `N` elements inline.
///
/// Adding an element to a full array is a contract violation: the `try_` variants return
/// [`ArrayError::CapacityExceeded`] and leave the array untouched, the other variants panic.
pub type FixedUtlArray<T, const N: usize> = GenericUtlArray<T, FixedBuffer<T, N>>;

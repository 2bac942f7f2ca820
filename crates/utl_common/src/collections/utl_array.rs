use core::{
    alloc::Layout,
    mem,
    ptr::{self, NonNull},
};
use std::alloc;

use super::{ArrayError, calc_grow_capacity, imp::utl_array::{ArrayBuffer, GenericUtlArray, InitBuffer}};

/// Storage that keeps all slots in a single heap allocation, which is reallocated when it needs to grow.
pub struct DynamicBuffer<T> {
    ptr       : NonNull<T>,
    cap       : usize,
    grow_size : usize,
}

impl<T> DynamicBuffer<T> {
    const IS_ZST: bool = mem::size_of::<T>() == 0;

    pub const fn new(grow_size: usize) -> Self {
        Self { ptr: NonNull::dangling(), cap: 0, grow_size }
    }

    fn layout(cap: usize) -> Result<Layout, ArrayError> {
        Layout::array::<T>(cap).map_err(|_| ArrayError::CapacityOverflow)
    }

    /// Move the allocation to one that fits exactly `new_cap` slots, the content of the first `min(cap, new_cap)` slots is kept.
    fn finish_grow(&mut self, new_cap: usize) -> Result<usize, ArrayError> {
        let new_layout = Self::layout(new_cap)?;

        let ptr = if self.cap == 0 {
            unsafe { alloc::alloc(new_layout) }
        } else {
            let old_layout = Self::layout(self.cap)?;
            unsafe { alloc::realloc(self.ptr.as_ptr().cast(), old_layout, new_layout.size()) }
        };

        // On failure, the old allocation is left untouched
        self.ptr = NonNull::new(ptr.cast()).ok_or(ArrayError::AllocError(new_layout))?;
        self.cap = new_cap;
        Ok(new_cap)
    }

    fn release(&mut self) {
        if self.cap > 0 {
            // The layout was valid when it was allocated
            if let Ok(layout) = Self::layout(self.cap) {
                unsafe { alloc::dealloc(self.ptr.as_ptr().cast(), layout) };
            }
            self.ptr = NonNull::dangling();
            self.cap = 0;
        }
    }
}

unsafe impl<T> ArrayBuffer<T> for DynamicBuffer<T> {
    const CONTIGUOUS: bool = true;

    fn capacity(&self) -> usize {
        if Self::IS_ZST {
            usize::MAX
        } else {
            self.cap
        }
    }

    fn grow_size(&self) -> usize {
        self.grow_size
    }

    fn set_grow_size(&mut self, grow_size: usize) {
        self.grow_size = grow_size;
    }

    fn try_grow(&mut self, num: usize) -> Result<usize, ArrayError> {
        if Self::IS_ZST {
            // Since we return a capacity of `usize::MAX` for zero-sized types, getting here means that the buffer is overfull
            return Err(ArrayError::CapacityOverflow);
        }

        let required = self.cap.checked_add(num).ok_or(ArrayError::CapacityOverflow)?;
        let new_cap = calc_grow_capacity(self.grow_size, self.cap, required)?;
        self.finish_grow(new_cap)
    }

    fn try_ensure_capacity(&mut self, capacity: usize) -> Result<usize, ArrayError> {
        if Self::IS_ZST || capacity <= self.cap {
            Ok(self.capacity())
        } else {
            self.finish_grow(capacity)
        }
    }

    fn purge(&mut self) {
        self.release();
    }

    fn purge_to(&mut self, keep: usize) {
        if Self::IS_ZST || keep >= self.cap {
            return;
        }

        if keep == 0 {
            self.release();
        } else {
            // Shrinking is best-effort, when the allocator refuses we just keep the larger block
            _ = self.finish_grow(keep);
        }
    }

    fn base(&self) -> Option<NonNull<T>> {
        Some(self.ptr)
    }

    unsafe fn slot(&self, index: usize) -> *const T {
        self.ptr.as_ptr().add(index)
    }

    unsafe fn slot_mut(&mut self, index: usize) -> *mut T {
        self.ptr.as_ptr().add(index)
    }

    unsafe fn relocate(&mut self, src: usize, dst: usize, count: usize) {
        if count > 0 && src != dst {
            let base = self.ptr.as_ptr();
            ptr::copy(base.add(src), base.add(dst), count);
        }
    }
}

impl<T> InitBuffer<T> for DynamicBuffer<T> {
    fn with_grow_size(grow_size: usize) -> Self {
        Self::new(grow_size)
    }
}

impl<T> Drop for DynamicBuffer<T> {
    fn drop(&mut self) {
        self.release();
    }
}

// The buffer uniquely owns its allocation
unsafe impl<T: Send> Send for DynamicBuffer<T> {}
unsafe impl<T: Sync> Sync for DynamicBuffer<T> {}

//------------------------------------------------------------------------------------------------------------------------------

/// Growable array that stores its elements in a single contiguous heap allocation.
///
/// By default, the capacity doubles whenever the array runs out of space, a non-zero grow size makes it grow by
/// multiples of that size instead.
///
/// ```
/// use utl_common::collections::UtlArray;
///
/// let mut arr = UtlArray::new();
/// arr.add_to_tail(5);
/// arr.add_to_tail(7);
/// arr.insert_before(1, 9);
/// assert_eq!(arr, [5, 9, 7]);
/// ```
pub type UtlArray<T> = GenericUtlArray<T, DynamicBuffer<T>>;

use core::{
    mem::{ManuallyDrop, MaybeUninit},
    ptr::{self, NonNull},
};
use utl_logging::log_verbose;

use crate::LOG_CAT;
use super::{ArrayError, calc_grow_capacity, imp::utl_array::{ArrayBuffer, GenericUtlArray, InitBuffer}, utl_array::DynamicBuffer};

union FixedGrowableData<T, const N: usize> {
    inline  : ManuallyDrop<MaybeUninit<[T; N]>>,
    dynamic : ManuallyDrop<DynamicBuffer<T>>,
}

impl<T, const N: usize> FixedGrowableData<T, N> {
    const fn new_inline() -> Self {
        Self { inline: ManuallyDrop::new(MaybeUninit::uninit()) }
    }
}

/// Storage with room for `N` elements inline, which moves to the heap once more space is needed.
///
/// Purging the buffer, or compacting it to `N` elements or less, returns it to the inline storage.
pub struct FixedGrowableBuffer<T, const N: usize> {
    spilled   : bool,
    grow_size : usize,
    data      : FixedGrowableData<T, N>,
}

impl<T, const N: usize> FixedGrowableBuffer<T, N> {
    pub const fn new(grow_size: usize) -> Self {
        Self { spilled: false, grow_size, data: FixedGrowableData::new_inline() }
    }

    /// Is the buffer currently using heap storage
    pub fn is_spilled(&self) -> bool {
        self.spilled
    }

    /// Move all `N` inline slots to a heap buffer with room for `new_cap` elements.
    fn spill(&mut self, new_cap: usize) -> Result<usize, ArrayError> {
        debug_assert!(!self.spilled);

        let mut dynamic = DynamicBuffer::new(self.grow_size);
        let cap = dynamic.try_ensure_capacity(new_cap)?;

        unsafe {
            ptr::copy_nonoverlapping(self.data.inline.as_ptr() as *const T, dynamic.slot_mut(0), N);
        }
        self.data = FixedGrowableData { dynamic: ManuallyDrop::new(dynamic) };
        self.spilled = true;

        log_verbose!(LOG_CAT, "Inline storage of {} elements exhausted, moved to the heap with room for {} elements", N, cap);
        Ok(cap)
    }

    /// Move the first `keep` slots back into the inline storage and release the heap buffer.
    fn unspill(&mut self, keep: usize) {
        debug_assert!(self.spilled && keep <= N);

        unsafe {
            let mut dynamic = ManuallyDrop::take(&mut self.data.dynamic);
            let mut data = FixedGrowableData::<T, N>::new_inline();
            if keep > 0 {
                ptr::copy_nonoverlapping(dynamic.slot(0), (*data.inline).as_mut_ptr() as *mut T, keep);
            }
            // Only releases the memory, the slots were moved out
            dynamic.purge();
            self.data = data;
        }
        self.spilled = false;

        log_verbose!(LOG_CAT, "Returned to inline storage of {} elements", N);
    }
}

unsafe impl<T, const N: usize> ArrayBuffer<T> for FixedGrowableBuffer<T, N> {
    const CONTIGUOUS: bool = true;

    fn capacity(&self) -> usize {
        if self.spilled {
            unsafe { self.data.dynamic.capacity() }
        } else {
            N
        }
    }

    fn grow_size(&self) -> usize {
        self.grow_size
    }

    fn set_grow_size(&mut self, grow_size: usize) {
        self.grow_size = grow_size;
        if self.spilled {
            unsafe { (*self.data.dynamic).set_grow_size(grow_size) };
        }
    }

    fn try_grow(&mut self, num: usize) -> Result<usize, ArrayError> {
        if self.spilled {
            unsafe { (*self.data.dynamic).try_grow(num) }
        } else {
            let required = N.checked_add(num).ok_or(ArrayError::CapacityOverflow)?;
            let new_cap = calc_grow_capacity(self.grow_size, N, required)?;
            self.spill(new_cap)
        }
    }

    fn try_ensure_capacity(&mut self, capacity: usize) -> Result<usize, ArrayError> {
        if self.spilled {
            unsafe { (*self.data.dynamic).try_ensure_capacity(capacity) }
        } else if capacity <= N {
            Ok(N)
        } else {
            self.spill(capacity)
        }
    }

    fn purge(&mut self) {
        if self.spilled {
            self.unspill(0);
        }
    }

    fn purge_to(&mut self, keep: usize) {
        if !self.spilled {
            return;
        }

        if keep <= N {
            self.unspill(keep);
        } else {
            unsafe { (*self.data.dynamic).purge_to(keep) };
        }
    }

    fn base(&self) -> Option<NonNull<T>> {
        if self.spilled {
            unsafe { self.data.dynamic.base() }
        } else {
            NonNull::new(unsafe { self.data.inline.as_ptr() } as *mut T)
        }
    }

    unsafe fn slot(&self, index: usize) -> *const T {
        if self.spilled {
            self.data.dynamic.slot(index)
        } else {
            (self.data.inline.as_ptr() as *const T).add(index)
        }
    }

    unsafe fn slot_mut(&mut self, index: usize) -> *mut T {
        if self.spilled {
            (*self.data.dynamic).slot_mut(index)
        } else {
            ((*self.data.inline).as_mut_ptr() as *mut T).add(index)
        }
    }

    unsafe fn relocate(&mut self, src: usize, dst: usize, count: usize) {
        if count > 0 && src != dst {
            let base = self.slot_mut(0);
            ptr::copy(base.add(src), base.add(dst), count);
        }
    }
}

impl<T, const N: usize> InitBuffer<T> for FixedGrowableBuffer<T, N> {
    fn with_grow_size(grow_size: usize) -> Self {
        Self::new(grow_size)
    }
}

impl<T, const N: usize> Drop for FixedGrowableBuffer<T, N> {
    fn drop(&mut self) {
        if self.spilled {
            unsafe { ManuallyDrop::drop(&mut self.data.dynamic) };
        }
    }
}

//------------------------------------------------------------------------------------------------------------------------------

/// Array that keeps up to `N` elements inline and transparently moves them to the heap when it needs more space.
///
/// While the elements are inline, the base address is stable. Once on the heap, it behaves like a [`UtlArray`](super::UtlArray).
pub type FixedGrowableUtlArray<T, const N: usize> = GenericUtlArray<T, FixedGrowableBuffer<T, N>>;

use core::{
    mem::MaybeUninit,
    ptr::{self, NonNull},
};

use super::{ArrayError, imp::utl_array::{ArrayBuffer, GenericUtlArray}};

/// Storage on top of memory owned by the caller.
///
/// The capacity is the length of the provided memory, the buffer can never grow past it and never frees it.
pub struct ExternalBuffer<'a, T> {
    mem: &'a mut [MaybeUninit<T>],
}

impl<'a, T> ExternalBuffer<'a, T> {
    pub fn new(mem: &'a mut [MaybeUninit<T>]) -> Self {
        Self { mem }
    }

    fn exceeded(&self, required: usize) -> ArrayError {
        ArrayError::CapacityExceeded { capacity: self.mem.len(), required }
    }
}

unsafe impl<'a, T> ArrayBuffer<T> for ExternalBuffer<'a, T> {
    const CONTIGUOUS: bool = true;

    fn capacity(&self) -> usize {
        self.mem.len()
    }

    fn grow_size(&self) -> usize {
        0
    }

    fn set_grow_size(&mut self, _grow_size: usize) {
    }

    fn try_grow(&mut self, num: usize) -> Result<usize, ArrayError> {
        Err(self.exceeded(self.mem.len().saturating_add(num)))
    }

    fn try_ensure_capacity(&mut self, capacity: usize) -> Result<usize, ArrayError> {
        if capacity <= self.mem.len() {
            Ok(self.mem.len())
        } else {
            Err(self.exceeded(capacity))
        }
    }

    fn purge(&mut self) {
    }

    fn purge_to(&mut self, _keep: usize) {
    }

    fn base(&self) -> Option<NonNull<T>> {
        NonNull::new(self.mem.as_ptr() as *mut T)
    }

    unsafe fn slot(&self, index: usize) -> *const T {
        self.mem.as_ptr().add(index).cast()
    }

    unsafe fn slot_mut(&mut self, index: usize) -> *mut T {
        self.mem.as_mut_ptr().add(index).cast()
    }

    unsafe fn relocate(&mut self, src: usize, dst: usize, count: usize) {
        if count > 0 && src != dst {
            let base = self.mem.as_mut_ptr();
            ptr::copy(base.add(src), base.add(dst), count);
        }
    }
}

//------------------------------------------------------------------------------------------------------------------------------

/// Array over memory provided by the caller.
///
/// Dropping the array drops the live elements, the memory itself stays with the caller.
///
/// ```
/// use core::mem::MaybeUninit;
/// use utl_common::collections::ExternalUtlArray;
///
/// let mut mem = [MaybeUninit::<u32>::uninit(); 4];
/// let mut arr = ExternalUtlArray::from_memory(&mut mem);
/// arr.add_to_tail(1);
/// arr.add_to_head(0);
/// assert_eq!(arr, [0, 1]);
/// assert!(arr.try_insert_multiple_before(2, 3).is_err());
/// ```
pub type ExternalUtlArray<'a, T> = GenericUtlArray<T, ExternalBuffer<'a, T>>;

impl<'a, T> GenericUtlArray<T, ExternalBuffer<'a, T>> {
    pub fn from_memory(mem: &'a mut [MaybeUninit<T>]) -> Self {
        Self::from_buffer(ExternalBuffer::new(mem))
    }

    /// Create an array over `mem` that adopts the `count` elements already living at its start.
    ///
    /// # Safety
    ///
    /// The first `count` elements of `mem` must be initialized. The array drops them, so they may not be dropped
    /// anywhere else.
    ///
    /// # Panics
    ///
    /// Panics when `count` is larger than the length of `mem`.
    pub unsafe fn from_memory_with_count(mem: &'a mut [MaybeUninit<T>], count: usize) -> Self {
        assert!(count <= mem.len(), "cannot adopt {count} elements from memory of {} slots", mem.len());
        Self::from_buffer_with_len(ExternalBuffer::new(mem), count)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use super::*;

    #[test]
    fn capacity_is_memory_length() {
        let mut mem: [MaybeUninit<u16>; 3] = [MaybeUninit::uninit(); 3];
        let mut arr = ExternalUtlArray::from_memory(&mut mem);
        assert_eq!(arr.capacity(), 3);

        arr.add_multiple_to_tail_from(&[1, 2, 3]);
        assert_eq!(arr.try_add_to_tail(4), Err(ArrayError::CapacityExceeded { capacity: 3, required: 4 }));
        assert_eq!(arr, [1, 2, 3]);
        assert!(arr.base().is_some());
    }

    #[test]
    fn adopts_live_elements() {
        let mut mem: [MaybeUninit<u32>; 4] = [MaybeUninit::new(4), MaybeUninit::new(5), MaybeUninit::uninit(), MaybeUninit::uninit()];
        let mut arr = unsafe { ExternalUtlArray::from_memory_with_count(&mut mem, 2) };
        assert_eq!(arr.count(), 2);
        assert_eq!(arr, [4, 5]);

        arr.add_to_head(3);
        arr.add_to_tail(6);
        assert_eq!(arr, [3, 4, 5, 6]);
        assert!(arr.try_add_to_tail(7).is_err());
    }

    #[test]
    fn adopted_elements_are_dropped_once() {
        let counter = Rc::new(());
        let mut mem: Vec<MaybeUninit<Rc<()>>> = vec![MaybeUninit::new(counter.clone()), MaybeUninit::uninit()];
        assert_eq!(Rc::strong_count(&counter), 2);
        {
            let mut arr = unsafe { ExternalUtlArray::from_memory_with_count(&mut mem, 1) };
            arr.add_to_tail(counter.clone());
            assert_eq!(Rc::strong_count(&counter), 3);
        }
        assert_eq!(Rc::strong_count(&counter), 1);
    }

    #[test]
    #[should_panic]
    fn adopting_more_than_memory_panics() {
        let mut mem: [MaybeUninit<u32>; 1] = [MaybeUninit::new(1)];
        let _arr = unsafe { ExternalUtlArray::from_memory_with_count(&mut mem, 2) };
    }

    #[test]
    fn drop_destroys_elements_but_keeps_memory() {
        let counter = Rc::new(());
        let mut mem: Vec<MaybeUninit<Rc<()>>> = (0..4).map(|_| MaybeUninit::uninit()).collect();
        {
            let mut arr = ExternalUtlArray::from_memory(&mut mem);
            arr.add_to_tail(counter.clone());
            arr.add_to_tail(counter.clone());
            assert_eq!(Rc::strong_count(&counter), 3);
        }
        assert_eq!(Rc::strong_count(&counter), 1);
        assert_eq!(mem.len(), 4);
    }
}

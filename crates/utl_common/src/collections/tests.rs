use core::{cell::Cell, cmp::Ordering};
use std::{panic::{self, AssertUnwindSafe}, rc::Rc};

use super::*;

#[test]
fn utl_array_new() {
    let arr = UtlArray::<i32>::new();
    assert_eq!(arr.capacity(), 0);
    assert_eq!(arr.count(), 0);
    assert!(arr.is_empty());

    let arr = UtlArray::<i32>::with_grow_size(0, 21);
    assert_eq!(arr.num_allocated(), 21);
    assert_eq!(arr.len(), 0);

    let arr = UtlArray::<i32>::with_config(ArrayConfig::new().with_grow_size(8).with_init_size(3));
    assert_eq!(arr.grow_size(), 8);
    assert_eq!(arr.capacity(), 3);
}

#[test]
fn utl_array_growth() {
    assert_eq!(calc_grow_capacity(0, 0, 1), Ok(1));
    assert_eq!(calc_grow_capacity(0, 4, 5), Ok(8));
    assert_eq!(calc_grow_capacity(0, 4, 13), Ok(13));
    assert_eq!(calc_grow_capacity(5, 0, 1), Ok(5));
    assert_eq!(calc_grow_capacity(5, 5, 12), Ok(15));
    assert_eq!(calc_grow_capacity(5, 5, 5), Ok(5));
    assert_eq!(calc_grow_capacity(0, usize::MAX / 2 + 1, usize::MAX), Err(ArrayError::CapacityOverflow));
    assert_eq!(calc_grow_capacity(4, 0, usize::MAX), Err(ArrayError::CapacityOverflow));

    let config = ArrayConfig::new().with_grow_size(3);
    assert_eq!(config.calc_capacity(3, 4), Ok(6));
}

#[test]
fn utl_array_add_to_tail() {
    let mut arr = UtlArray::new();
    assert_eq!(arr.add_to_tail(5), 0);
    assert_eq!(arr.add_to_tail(7), 1);
    assert_eq!(arr.add_to_tail(3), 2);

    assert_eq!(arr.count(), 3);
    assert_eq!(arr, [5, 7, 3]);
    assert_eq!(*arr.head(), 5);
    assert_eq!(*arr.tail(), 3);
}

#[test]
fn utl_array_insert_before() {
    let mut arr = UtlArray::new();
    arr.add_multiple_to_tail_from(&[5, 7, 3]);

    assert_eq!(arr.insert_before(1, 9), 1);
    assert_eq!(arr, [5, 9, 7, 3]);
    assert_eq!(arr.count(), 4);

    assert_eq!(arr.insert_after(3, 1), 4);
    assert_eq!(arr.add_to_head(0), 0);
    assert_eq!(arr, [0, 5, 9, 7, 3, 1]);

    assert_eq!(arr.try_insert_before(7, 2), Err(ArrayError::IndexOutOfBounds { index: 7, len: 6 }));
    assert_eq!(arr.count(), 6);
}

#[test]
fn utl_array_remove() {
    let mut arr = UtlArray::new();
    arr.add_multiple_to_tail_from(&[5, 9, 7, 3]);
    assert_eq!(arr.remove(0), 5);
    assert_eq!(arr, [9, 7, 3]);

    let mut arr = UtlArray::new();
    arr.add_multiple_to_tail_from(&[5, 9, 7, 3]);
    assert_eq!(arr.fast_remove(0), 5);
    assert_eq!(arr, [3, 9, 7]);

    assert_eq!(arr.fast_remove(2), 7);
    assert_eq!(arr, [3, 9]);

    assert_eq!(arr.try_remove(2), Err(ArrayError::IndexOutOfBounds { index: 2, len: 2 }));
    assert_eq!(arr.try_fast_remove(5), Err(ArrayError::IndexOutOfBounds { index: 5, len: 2 }));
}

#[test]
fn utl_array_fast_remove_only_moves_last() {
    let mut arr = UtlArray::new();
    arr.add_multiple_to_tail_from(&[0, 1, 2, 3, 4, 5]);
    arr.fast_remove(2);
    assert_eq!(arr.count(), 5);
    assert_eq!(arr, [0, 1, 5, 3, 4]);
}

#[test]
fn utl_array_remove_multiple() {
    let mut arr = UtlArray::new();
    arr.add_multiple_to_tail_from(&[0, 1, 2, 3, 4, 5, 6]);

    arr.remove_multiple(2, 3);
    assert_eq!(arr, [0, 1, 5, 6]);

    arr.remove_multiple(1, 0);
    assert_eq!(arr, [0, 1, 5, 6]);

    assert_eq!(arr.try_remove_multiple(2, 3), Err(ArrayError::RangeOutOfBounds { start: 2, count: 3, len: 4 }));
    assert_eq!(arr.try_remove_multiple(1, usize::MAX), Err(ArrayError::RangeOutOfBounds { start: 1, count: usize::MAX, len: 4 }));
    assert_eq!(arr, [0, 1, 5, 6]);

    arr.remove_multiple(0, 4);
    assert!(arr.is_empty());
}

#[test]
fn utl_array_insert_multiple() {
    let mut arr = UtlArray::new();
    assert_eq!(arr.insert_multiple_before_from(0, &[1, 2, 3]), 0);
    assert_eq!(arr, [1, 2, 3]);
    assert_eq!(arr.capacity(), 3);

    assert_eq!(arr.insert_multiple_before(1, 2), 1);
    assert_eq!(arr, [1, 0, 0, 2, 3]);

    assert_eq!(arr.insert_multiple_after(4, 1), 5);
    assert_eq!(arr.add_multiple_to_head(1), 0);
    assert_eq!(arr, [0, 1, 0, 0, 2, 3, 0]);

    assert_eq!(arr.insert_multiple_before(3, 0), 3);
    assert_eq!(arr.count(), 7);
}

#[test]
fn utl_array_default_inserts() {
    let mut arr = UtlArray::<String>::new();
    arr.add_default_to_tail();
    arr.add_default_to_head();
    arr[1].push_str("tail");
    arr.insert_default_after(0);
    arr.insert_default_before(0);
    assert_eq!(arr, ["", "", "", "tail"]);
}

#[test]
fn utl_array_find() {
    let mut arr = UtlArray::new();
    arr.add_multiple_to_tail_from(&[4, 8, 15, 16, 23, 42, 15]);

    assert_eq!(arr.find(&15), Some(2));
    assert_eq!(arr.find(&7), None);
    assert!(arr.has_element(&42));
    assert!(!arr.has_element(&0));

    assert!(arr.find_and_remove(&15));
    assert_eq!(arr, [4, 8, 16, 23, 42, 15]);
    assert!(!arr.find_and_remove(&99));
    assert_eq!(arr.count(), 6);
}

#[test]
fn utl_array_valid_index() {
    let mut arr = UtlArray::new();
    assert!(!arr.is_valid_index(0));

    arr.add_multiple_to_tail_from(&[1, 2]);
    assert!(arr.is_valid_index(0));
    assert!(arr.is_valid_index(1));
    assert!(!arr.is_valid_index(2));

    assert_eq!(arr.get(1), Some(&2));
    assert_eq!(arr.get(2), None);
    assert_eq!(unsafe { *arr.element_unchecked(0) }, 1);

    *arr.element_mut(0) = 10;
    *arr.tail_mut() += 5;
    assert_eq!(arr, [10, 7]);
}

#[test]
fn utl_array_empty_head_and_tail() {
    let arr = UtlArray::<u8>::new();
    assert_eq!(arr.try_head(), Err(ArrayError::EmptyArray));
    assert_eq!(arr.try_tail(), Err(ArrayError::EmptyArray));
}

#[test]
#[should_panic(expected = "index (is 3) should be < len (is 3)")]
fn utl_array_index_out_of_bounds() {
    let mut arr = UtlArray::new();
    arr.add_multiple_to_tail_from(&[1, 2, 3]);
    let _val = arr[3];
}

#[test]
fn utl_array_set_count() {
    let mut arr = UtlArray::new();
    arr.add_multiple_to_tail_from(&[1, 2, 3]);

    arr.set_count(5);
    assert_eq!(arr, [0, 0, 0, 0, 0]);

    arr.set_size(1);
    assert_eq!(arr, [0]);

    arr[0] = 4;
    arr.ensure_count(3);
    assert_eq!(arr, [4, 0, 0]);

    // Never shrinks
    arr.ensure_count(1);
    assert_eq!(arr.count(), 3);
}

#[test]
fn utl_array_copy_array() {
    let src = [3, 1, 4, 1, 5];

    let mut arr = UtlArray::new();
    arr.add_multiple_to_tail_from(&[9, 9]);
    arr.copy_array(&src);
    assert_eq!(arr, src);
    assert_eq!(arr.as_slice(), Some(&src[..]));

    arr.copy_array(&[]);
    assert!(arr.is_empty());
}

fn copy_into<T: Clone, B: ArrayBuffer<T>>(arr: &mut GenericUtlArray<T, B>, src: &[T]) {
    arr.copy_array(src);
}

#[test]
fn utl_array_copy_array_any_policy() {
    let src = [String::from("a"), String::from("b"), String::from("c")];

    let mut block = BlockUtlArray::with_grow_size(2, 0);
    block.add_to_tail(String::from("z"));
    copy_into(&mut block, &src);
    assert_eq!(block, src);

    let mut fixed = FixedUtlArray::<String, 4>::new();
    copy_into(&mut fixed, &src);
    assert_eq!(fixed, src);

    let mut small = FixedGrowableUtlArray::<String, 2>::new();
    copy_into(&mut small, &src);
    assert_eq!(small, src);
}

#[test]
fn utl_array_extend_follows_growth_policy() {
    let mut arr = UtlArray::<u32>::new();
    let mut capacities = Vec::new();
    for i in 0..8 {
        arr.extend(core::iter::once(i));
        capacities.push(arr.capacity());
    }
    assert_eq!(capacities, [1, 2, 4, 4, 8, 8, 8, 8]);
    assert_eq!(arr, [0, 1, 2, 3, 4, 5, 6, 7]);

    let mut arr = UtlArray::<u32>::with_grow_size(3, 0);
    arr.extend([1, 2, 3, 4]);
    assert_eq!(arr.capacity(), 6);
}

#[test]
fn utl_array_swap() {
    let mut a = UtlArray::new();
    a.add_multiple_to_tail_from(&[1, 2, 3]);
    let mut b = UtlArray::with_grow_size(4, 0);
    b.add_to_tail(4);

    let a_base = a.base();
    a.swap(&mut b);

    assert_eq!(a, [4]);
    assert_eq!(b, [1, 2, 3]);
    assert_eq!(a.grow_size(), 4);
    assert_eq!(b.base(), a_base);
}

#[test]
fn utl_array_swap_inline() {
    let mut a = FixedUtlArray::<String, 4>::new();
    a.add_to_tail("a".to_string());
    let mut b = FixedUtlArray::<String, 4>::new();
    b.add_multiple_to_tail_from(&["b".to_string(), "c".to_string()]);

    a.swap(&mut b);
    assert_eq!(a, ["b", "c"]);
    assert_eq!(b, ["a"]);
}

#[test]
fn utl_array_add_vector_to_tail() {
    let mut a = UtlArray::new();
    a.add_multiple_to_tail_from(&[1, 2]);

    let mut b = BlockUtlArray::with_grow_size(2, 0);
    b.add_multiple_to_tail_from(&[3, 4, 5]);

    assert_eq!(a.add_vector_to_tail(&b), 2);
    assert_eq!(a, [1, 2, 3, 4, 5]);
    assert_eq!(b, [3, 4, 5]);
}

#[test]
fn utl_array_ensure_capacity() {
    let mut arr = UtlArray::new();
    arr.ensure_capacity(10);
    assert_eq!(arr.capacity(), 10);
    assert!(arr.is_empty());

    let base = arr.base();
    for i in 0..10 {
        arr.add_to_tail(i);
    }
    assert_eq!(arr.capacity(), 10);
    assert_eq!(arr.base(), base);

    // Already large enough
    arr.ensure_capacity(4);
    assert_eq!(arr.capacity(), 10);
}

#[test]
fn utl_array_purge() {
    let mut arr = UtlArray::new();
    arr.add_multiple_to_tail_from(&[1, 2, 3]);

    arr.remove_all();
    assert!(arr.is_empty());
    assert_eq!(arr.capacity(), 3);

    arr.add_to_tail(1);
    arr.purge();
    assert!(arr.is_empty());
    assert_eq!(arr.capacity(), 0);

    arr.purge();
    assert!(arr.is_empty());
    assert_eq!(arr.capacity(), 0);
}

#[test]
fn utl_array_compact() {
    let mut arr = UtlArray::with_grow_size(8, 0);
    arr.add_multiple_to_tail_from(&[1, 2, 3]);
    assert_eq!(arr.capacity(), 8);

    arr.compact();
    assert_eq!(arr.capacity(), 3);
    assert_eq!(arr, [1, 2, 3]);
}

#[test]
fn utl_array_destruction_order() {
    let order = Rc::new(std::cell::RefCell::new(Vec::new()));

    struct Logged(u32, Rc<std::cell::RefCell<Vec<u32>>>);
    impl Drop for Logged {
        fn drop(&mut self) {
            self.1.borrow_mut().push(self.0);
        }
    }

    let mut arr = UtlArray::new();
    for i in 0..3 {
        arr.add_to_tail(Logged(i, order.clone()));
    }
    arr.remove_all();
    assert_eq!(*order.borrow(), [2, 1, 0]);

    order.borrow_mut().clear();
    for i in 0..3 {
        arr.add_to_tail(Logged(i, order.clone()));
    }
    arr.purge_and_delete_elements();
    assert_eq!(*order.borrow(), [0, 1, 2]);
    assert_eq!(arr.capacity(), 0);
}

#[test]
fn utl_array_drops_every_element() {
    let counter = Rc::new(());
    {
        let mut arr = BlockUtlArray::with_grow_size(2, 0);
        for _ in 0..5 {
            arr.add_to_tail(counter.clone());
        }
        arr.remove(1);
        arr.remove_multiple(0, 2);
        assert_eq!(Rc::strong_count(&counter), 3);
    }
    assert_eq!(Rc::strong_count(&counter), 1);
}

#[test]
fn utl_array_sort() {
    let mut arr = UtlArray::new();
    arr.add_multiple_to_tail_from(&[5, 2, 9, 1, 5, 6]);
    arr.sort();
    assert_eq!(arr, [1, 2, 5, 5, 6, 9]);

    arr.sort_by(|a, b| b.cmp(a));
    assert_eq!(arr, [9, 6, 5, 5, 2, 1]);

    let mut arr = BlockUtlArray::with_grow_size(2, 0);
    arr.add_multiple_to_tail_from(&[5, 2, 9, 1, 5, 6]);
    arr.sort();
    assert_eq!(arr, [1, 2, 5, 5, 6, 9]);

    let mut arr = UtlArray::<i32>::new();
    arr.sort_by(|_, _| Ordering::Less);
    arr.add_to_tail(1);
    arr.sort_by(|_, _| Ordering::Less);
    assert_eq!(arr, [1]);
}

#[test]
fn utl_array_iter() {
    let mut arr = BlockUtlArray::with_grow_size(2, 0);
    arr.add_multiple_to_tail_from(&[1, 2, 3, 4, 5]);

    assert_eq!(arr.iter().copied().collect::<Vec<_>>(), [1, 2, 3, 4, 5]);
    assert_eq!(arr.iter().rev().copied().collect::<Vec<_>>(), [5, 4, 3, 2, 1]);
    assert_eq!(arr.iter().len(), 5);

    for val in &mut arr {
        *val *= 10;
    }
    assert_eq!(arr, [10, 20, 30, 40, 50]);

    let mut arr2 = UtlArray::new();
    arr2.extend((&arr).into_iter().map(|val| val + 1));
    for val in arr2.iter_mut().rev().take(2) {
        *val = 0;
    }
    assert_eq!(arr2, [11, 21, 31, 0, 0]);
}

#[test]
fn utl_array_eq() {
    let mut a = UtlArray::new();
    a.add_multiple_to_tail_from(&[1, 2, 3]);
    let mut b = FixedUtlArray::<i32, 3>::new();
    b.add_multiple_to_tail_from(&[1, 2, 3]);

    assert_eq!(a, b);
    assert_eq!(a, [1, 2, 3]);
    assert_eq!(a, &[1, 2, 3][..]);
    assert_ne!(a, [1, 2]);
}

#[test]
fn utl_array_debug_and_diagnostics() {
    let mut arr = UtlArray::with_grow_size(4, 0);
    arr.add_multiple_to_tail_from(&[1, 2, 3]);
    assert_eq!(format!("{arr:?}"), "[1, 2, 3]");

    let diag = arr.diagnostics();
    assert_eq!(diag, ArrayDiagnostics { len: 3, capacity: 4, grow_size: 4, segments: 1, contiguous: true });
    assert_eq!(diag.to_string(), "3/4 elements, grow size 4, 1 segment(s), contiguous");
}

#[test]
fn fixed_utl_array_rejects_past_bound() {
    let mut arr = FixedUtlArray::<i32, 4>::new();
    for i in 0..4 {
        arr.add_to_tail(i);
    }

    let err = arr.try_add_to_tail(4).unwrap_err();
    assert_eq!(err, ArrayError::CapacityExceeded { capacity: 4, required: 5 });
    assert_eq!(err.kind(), ErrorKind::ContractViolation);
    assert_eq!(arr, [0, 1, 2, 3]);
}

#[test]
#[should_panic(expected = "capacity exceeded")]
fn fixed_utl_array_panics_past_bound() {
    let mut arr = FixedUtlArray::<i32, 1>::new();
    arr.add_to_tail(0);
    arr.add_to_tail(1);
}

#[test]
fn utl_array_error_kinds() {
    assert_eq!(ArrayError::CapacityOverflow.kind(), ErrorKind::AllocFailure);
    assert!(!ArrayError::CapacityOverflow.is_contract_violation());
    assert!(ArrayError::EmptyArray.is_contract_violation());
    assert!(ArrayError::IndexOutOfBounds { index: 0, len: 0 }.is_contract_violation());
}

#[test]
fn utl_array_capacity_overflow_is_recoverable() {
    let mut arr = UtlArray::<u64>::new();
    assert_eq!(arr.try_ensure_capacity(usize::MAX), Err(ArrayError::CapacityOverflow));
    assert_eq!(arr.capacity(), 0);

    arr.add_to_tail(1);
    assert_eq!(arr.try_insert_multiple_before(0, usize::MAX), Err(ArrayError::CapacityOverflow));
    assert_eq!(arr, [1]);
}

#[test]
fn block_utl_array_capacity_overflow_is_recoverable() {
    let mut arr = BlockUtlArray::<u64>::new();
    assert_eq!(arr.try_ensure_capacity(1 << 60), Err(ArrayError::CapacityOverflow));
    assert_eq!(arr.try_ensure_capacity(usize::MAX), Err(ArrayError::CapacityOverflow));
    assert_eq!(arr.capacity(), 0);
    assert_eq!(arr.diagnostics().segments, 0);

    arr.add_to_tail(1);
    let capacity = arr.capacity();
    assert_eq!(arr.try_ensure_capacity(1 << 60), Err(ArrayError::CapacityOverflow));
    assert_eq!(arr.try_insert_multiple_before(0, 1 << 60), Err(ArrayError::CapacityOverflow));
    assert_eq!(arr.capacity(), capacity);
    assert_eq!(arr, [1]);
}

//--------------------------------------------------------------

struct CloneBudget {
    id     : u32,
    budget : Rc<Cell<u32>>,
    drops  : Rc<Cell<u32>>,
}

impl Clone for CloneBudget {
    fn clone(&self) -> Self {
        if self.budget.get() == 0 {
            panic!("out of clones");
        }
        self.budget.set(self.budget.get() - 1);
        Self { id: self.id, budget: self.budget.clone(), drops: self.drops.clone() }
    }
}

impl Drop for CloneBudget {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

fn ids<B: ArrayBuffer<CloneBudget>>(arr: &GenericUtlArray<CloneBudget, B>) -> Vec<u32> {
    arr.iter().map(|val| val.id).collect()
}

fn panic_during_bulk_insert<B: InitBuffer<CloneBudget>>(grow_size: usize) {
    let budget = Rc::new(Cell::new(u32::MAX));
    let drops = Rc::new(Cell::new(0));
    let make = |id| CloneBudget { id, budget: budget.clone(), drops: drops.clone() };

    let mut arr = GenericUtlArray::<CloneBudget, B>::with_grow_size(grow_size, 0);
    for id in [1, 2, 3] {
        arr.add_to_tail(make(id));
    }
    let src = [make(10), make(11), make(12)];

    budget.set(2);
    let res = panic::catch_unwind(AssertUnwindSafe(|| arr.insert_multiple_before_from(1, &src)));
    assert!(res.is_err());

    // The 2 clones that were made got dropped, the original elements are back in place
    assert_eq!(drops.get(), 2);
    assert_eq!(ids(&arr), [1, 2, 3]);

    budget.set(u32::MAX);
    arr.insert_multiple_before_from(1, &src);
    assert_eq!(ids(&arr), [1, 10, 11, 12, 2, 3]);
}

#[test]
fn utl_array_panic_during_bulk_insert() {
    panic_during_bulk_insert::<DynamicBuffer<CloneBudget>>(0);
    panic_during_bulk_insert::<BlockBuffer<CloneBudget>>(2);
    panic_during_bulk_insert::<FixedGrowableBuffer<CloneBudget, 2>>(0);
}

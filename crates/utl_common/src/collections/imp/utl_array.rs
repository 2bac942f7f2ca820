use core::{
    cmp::Ordering,
    fmt,
    iter::FusedIterator,
    marker::PhantomData,
    mem,
    ops::{Index, IndexMut},
    ptr::{self, NonNull},
    slice,
};
use scopeguard::ScopeGuard;
use utl_logging::log_error;

use crate::{
    LOG_CAT,
    collections::{ArrayConfig, ArrayError, impl_seq_partial_eq, lifecycle},
};

/// Trait representing the storage policy behind any [`GenericUtlArray`].
///
/// A buffer owns the raw memory for its slots but never looks at what is stored in them, constructing and destroying
/// elements is the job of the array.
///
/// # Safety
///
/// - `slot` and `slot_mut` must return a valid, properly aligned pointer for every `index < capacity()`.
/// - Growing must keep the content of all existing slots at the same logical index.
/// - When `CONTIGUOUS` is `true`, slot `i` must live at `slot_mut(0).add(i)` for every `i < capacity()`.
pub unsafe trait ArrayBuffer<T> {
    /// Do all slots live in one contiguous region of memory
    const CONTIGUOUS: bool;

    /// Number of slots that are currently allocated.
    fn capacity(&self) -> usize;

    /// Number of slots the buffer grows by, `0` means doubling.
    fn grow_size(&self) -> usize;

    fn set_grow_size(&mut self, grow_size: usize);

    /// Grow the buffer by at least `num` slots, according to the buffer's grow size, and return the new capacity.
    fn try_grow(&mut self, num: usize) -> Result<usize, ArrayError>;

    /// Make sure at least `capacity` slots are allocated, without over-allocating where possible, and return the new capacity.
    fn try_ensure_capacity(&mut self, capacity: usize) -> Result<usize, ArrayError>;

    /// Release all memory owned by the buffer.
    ///
    /// Any element still in the buffer is leaked, the array is responsible for destroying them first.
    fn purge(&mut self);

    /// Release the memory for all slots past `keep`, if the buffer is able to.
    fn purge_to(&mut self, keep: usize);

    /// Base address of the slots, only available for contiguous storage.
    ///
    /// The address may change whenever the buffer grows or is purged.
    fn base(&self) -> Option<NonNull<T>>;

    /// Number of separately allocated regions the slots are spread over.
    fn segment_count(&self) -> usize {
        if self.capacity() == 0 { 0 } else { 1 }
    }

    /// # Safety
    ///
    /// `index` must be less than `capacity()`
    unsafe fn slot(&self, index: usize) -> *const T;

    /// # Safety
    ///
    /// `index` must be less than `capacity()`
    unsafe fn slot_mut(&mut self, index: usize) -> *mut T;

    /// Move `count` slots starting at logical index `src` to start at logical index `dst`.
    ///
    /// The source and destination ranges may overlap. The content is moved bitwise, after the call the slots in the
    /// source range that are not part of the destination range are considered uninitialized.
    ///
    /// # Safety
    ///
    /// Both `src + count` and `dst + count` must be less or equal to `capacity()`.
    unsafe fn relocate(&mut self, src: usize, dst: usize, count: usize) {
        if count == 0 || src == dst {
            return;
        }

        if dst > src {
            // Moving right, so start at the back to not overwrite anything we still need
            for i in (0..count).rev() {
                let s = self.slot_mut(src + i);
                let d = self.slot_mut(dst + i);
                ptr::copy_nonoverlapping(s, d, 1);
            }
        } else {
            for i in 0..count {
                let s = self.slot_mut(src + i);
                let d = self.slot_mut(dst + i);
                ptr::copy_nonoverlapping(s, d, 1);
            }
        }
    }
}

/// A buffer that can be created from nothing more than its grow size.
pub trait InitBuffer<T>: ArrayBuffer<T> + Sized {
    fn with_grow_size(grow_size: usize) -> Self;
}

/// Snapshot of an array's internal bookkeeping, meant for debugging and validation tools.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ArrayDiagnostics {
    pub len        : usize,
    pub capacity   : usize,
    pub grow_size  : usize,
    pub segments   : usize,
    pub contiguous : bool,
}

impl fmt::Display for ArrayDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = if self.contiguous { "contiguous" } else { "paged" };
        write!(f, "{}/{} elements, grow size {}, {} segment(s), {layout}", self.len, self.capacity, self.grow_size, self.segments)
    }
}

#[cold]
#[track_caller]
fn contract_failure(err: ArrayError) -> ! {
    log_error!(LOG_CAT, "{err}");
    panic!("{err}")
}

#[inline]
#[track_caller]
fn unwrap_or_fail<R>(res: Result<R, ArrayError>) -> R {
    match res {
        Ok(val) => val,
        Err(err) => contract_failure(err),
    }
}

//------------------------------------------------------------------------------------------------------------------------------

/// An index-addressed growable array, generic over the storage policy that backs it.
///
/// Elements are kept in logical index order, `[0, len)` are live and every slot past `len` is uninitialized.
/// Depending on the buffer, elements may move to a different address on any call that mutates the array, so elements
/// should always be referred to by index, never by address.
///
/// Every operation that can fail has a `try_` variant returning an [`ArrayError`], the plain variant logs the error and panics.
pub struct GenericUtlArray<T, B: ArrayBuffer<T>> {
    len            : usize,
    pub(crate) buf : B,
    _p             : PhantomData<T>,
}

impl<T, B: ArrayBuffer<T>> GenericUtlArray<T, B> {
    #[inline]
    pub const fn from_buffer(buf: B) -> Self {
        Self { len: 0, buf, _p: PhantomData }
    }

    /// Create an array that takes ownership of the first `len` slots of `buf`.
    ///
    /// # Safety
    ///
    /// The slots `[0, len)` of `buf` must hold initialized elements, and `len` may not exceed its capacity.
    pub(crate) const unsafe fn from_buffer_with_len(buf: B, len: usize) -> Self {
        Self { len, buf, _p: PhantomData }
    }

    /// Returns the number of elements in the array.
    #[inline]
    pub fn count(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_valid_index(&self, index: usize) -> bool {
        index < self.len
    }

    /// Number of elements the array can hold before it needs to grow.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    #[inline]
    pub fn num_allocated(&self) -> usize {
        self.buf.capacity()
    }

    #[inline]
    pub fn grow_size(&self) -> usize {
        self.buf.grow_size()
    }

    #[inline]
    pub fn set_grow_size(&mut self, grow_size: usize) {
        self.buf.set_grow_size(grow_size)
    }

    /// Base address of the elements, `None` when the storage is not contiguous.
    ///
    /// The address can change when adding elements!
    #[inline]
    pub fn base(&self) -> Option<NonNull<T>> {
        self.buf.base()
    }

    #[inline]
    pub fn buffer(&self) -> &B {
        &self.buf
    }

    pub fn diagnostics(&self) -> ArrayDiagnostics {
        ArrayDiagnostics {
            len: self.len,
            capacity: self.buf.capacity(),
            grow_size: self.buf.grow_size(),
            segments: self.buf.segment_count(),
            contiguous: B::CONTIGUOUS,
        }
    }

    /// Get the elements as a slice, only available when the storage is contiguous.
    pub fn as_slice(&self) -> Option<&[T]> {
        if !B::CONTIGUOUS {
            None
        } else if self.len == 0 {
            Some(&[])
        } else {
            // SAFETY: contiguous storage keeps `[0, len)` live next to each other
            Some(unsafe { slice::from_raw_parts(self.buf.slot(0), self.len) })
        }
    }

    /// Get the elements as a mutable slice, only available when the storage is contiguous.
    pub fn as_mut_slice(&mut self) -> Option<&mut [T]> {
        if !B::CONTIGUOUS {
            None
        } else if self.len == 0 {
            Some(&mut [])
        } else {
            Some(unsafe { slice::from_raw_parts_mut(self.buf.slot_mut(0), self.len) })
        }
    }

    fn check_index(&self, index: usize) -> Result<(), ArrayError> {
        if index < self.len {
            Ok(())
        } else {
            Err(ArrayError::IndexOutOfBounds { index, len: self.len })
        }
    }

    fn check_insert_index(&self, index: usize) -> Result<(), ArrayError> {
        // Inserting at `len` appends
        if index <= self.len {
            Ok(())
        } else {
            Err(ArrayError::IndexOutOfBounds { index, len: self.len })
        }
    }

    //--------------------------------------------------------------
    // Element access

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len {
            Some(unsafe { &*self.buf.slot(index) })
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len {
            Some(unsafe { &mut *self.buf.slot_mut(index) })
        } else {
            None
        }
    }

    #[inline]
    #[track_caller]
    pub fn element(&self, index: usize) -> &T {
        match self.get(index) {
            Some(elem) => elem,
            None => contract_failure(ArrayError::IndexOutOfBounds { index, len: self.len }),
        }
    }

    #[inline]
    #[track_caller]
    pub fn element_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(elem) => elem,
            None => contract_failure(ArrayError::IndexOutOfBounds { index, len }),
        }
    }

    /// # Safety
    ///
    /// `index` must be a valid index.
    #[inline]
    pub unsafe fn element_unchecked(&self, index: usize) -> &T {
        debug_assert!(self.is_valid_index(index));
        &*self.buf.slot(index)
    }

    /// # Safety
    ///
    /// `index` must be a valid index.
    #[inline]
    pub unsafe fn element_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(self.is_valid_index(index));
        &mut *self.buf.slot_mut(index)
    }

    #[inline]
    pub fn try_head(&self) -> Result<&T, ArrayError> {
        self.get(0).ok_or(ArrayError::EmptyArray)
    }

    #[inline]
    pub fn try_tail(&self) -> Result<&T, ArrayError> {
        match self.len {
            0 => Err(ArrayError::EmptyArray),
            len => Ok(unsafe { &*self.buf.slot(len - 1) }),
        }
    }

    #[inline]
    #[track_caller]
    pub fn head(&self) -> &T {
        unwrap_or_fail(self.try_head())
    }

    #[inline]
    #[track_caller]
    pub fn head_mut(&mut self) -> &mut T {
        match self.len {
            0 => contract_failure(ArrayError::EmptyArray),
            _ => unsafe { &mut *self.buf.slot_mut(0) },
        }
    }

    #[inline]
    #[track_caller]
    pub fn tail(&self) -> &T {
        unwrap_or_fail(self.try_tail())
    }

    #[inline]
    #[track_caller]
    pub fn tail_mut(&mut self) -> &mut T {
        match self.len {
            0 => contract_failure(ArrayError::EmptyArray),
            len => unsafe { &mut *self.buf.slot_mut(len - 1) },
        }
    }

    pub fn iter(&self) -> Iter<'_, T, B> {
        Iter { arr: self, front: 0, back: self.len }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T, B> {
        IterMut::new(self)
    }

    //--------------------------------------------------------------
    // Capacity

    /// Make sure there is space for `num` more elements, growing the storage according to its grow size.
    fn grow_vector(&mut self, num: usize) -> Result<(), ArrayError> {
        let required = self.len.checked_add(num).ok_or(ArrayError::CapacityOverflow)?;
        let capacity = self.buf.capacity();
        if required > capacity {
            self.buf.try_grow(required - capacity)?;
        }
        Ok(())
    }

    /// Make sure the array has space for at least `capacity` elements, without changing its length.
    pub fn try_ensure_capacity(&mut self, capacity: usize) -> Result<(), ArrayError> {
        if capacity > self.buf.capacity() {
            self.buf.try_ensure_capacity(capacity)?;
        }
        Ok(())
    }

    #[track_caller]
    pub fn ensure_capacity(&mut self, capacity: usize) {
        unwrap_or_fail(self.try_ensure_capacity(capacity))
    }

    /// Release the capacity that is not used by any element, as far as the storage allows.
    pub fn compact(&mut self) {
        self.buf.purge_to(self.len);
    }

    //--------------------------------------------------------------
    // Insertion

    /// Insert `value` before the element at `index` and return the index it ended up at, i.e. `index`.
    ///
    /// `index == len()` appends the element.
    pub fn try_insert_before(&mut self, index: usize, value: T) -> Result<usize, ArrayError> {
        self.check_insert_index(index)?;
        self.grow_vector(1)?;

        unsafe {
            self.buf.relocate(index, index + 1, self.len - index);
            lifecycle::move_construct(self.buf.slot_mut(index), value);
        }
        self.len += 1;
        Ok(index)
    }

    #[track_caller]
    pub fn insert_before(&mut self, index: usize, value: T) -> usize {
        unwrap_or_fail(self.try_insert_before(index, value))
    }

    pub fn try_insert_after(&mut self, index: usize, value: T) -> Result<usize, ArrayError> {
        self.try_insert_before(index.saturating_add(1), value)
    }

    #[track_caller]
    pub fn insert_after(&mut self, index: usize, value: T) -> usize {
        unwrap_or_fail(self.try_insert_after(index, value))
    }

    pub fn try_add_to_head(&mut self, value: T) -> Result<usize, ArrayError> {
        self.try_insert_before(0, value)
    }

    #[track_caller]
    pub fn add_to_head(&mut self, value: T) -> usize {
        unwrap_or_fail(self.try_add_to_head(value))
    }

    pub fn try_add_to_tail(&mut self, value: T) -> Result<usize, ArrayError> {
        self.try_insert_before(self.len, value)
    }

    #[track_caller]
    pub fn add_to_tail(&mut self, value: T) -> usize {
        unwrap_or_fail(self.try_add_to_tail(value))
    }

    /// Open a gap of `num` slots before `index` in a single grow and shift, and fill it by calling `init` for each new slot.
    ///
    /// When `init` panics, the elements constructed so far are dropped and the tail is shifted back, leaving the array as it was.
    ///
    /// # Safety
    ///
    /// `init(k, slot)` must initialize `slot`, which is the slot at `index + k`, or panic.
    unsafe fn insert_multiple_with<F>(&mut self, index: usize, num: usize, mut init: F) -> Result<usize, ArrayError> where
        F : FnMut(usize, *mut T)
    {
        self.check_insert_index(index)?;
        if num == 0 {
            return Ok(index);
        }
        self.grow_vector(num)?;

        let len = self.len;
        let tail = len - index;
        self.buf.relocate(index, index + num, tail);

        // Until the gap is filled, only the elements in front of it are live
        self.len = index;

        let mut guard = scopeguard::guard((self, 0usize), move |(arr, written)| {
            for k in (0..written).rev() {
                lifecycle::destruct(arr.buf.slot_mut(index + k));
            }
            arr.buf.relocate(index + num, index, tail);
            arr.len = len;
        });

        while guard.1 < num {
            let (arr, written) = &mut *guard;
            init(*written, arr.buf.slot_mut(index + *written));
            *written += 1;
        }

        let (arr, _) = ScopeGuard::into_inner(guard);
        arr.len = len + num;
        Ok(index)
    }

    /// Insert `src.len()` copies of the elements in `src` before `index`, in one grow and shift.
    pub fn try_insert_multiple_before_from(&mut self, index: usize, src: &[T]) -> Result<usize, ArrayError> where
        T : Clone
    {
        unsafe { self.insert_multiple_with(index, src.len(), |k, slot| lifecycle::copy_construct(slot, &src[k])) }
    }

    #[track_caller]
    pub fn insert_multiple_before_from(&mut self, index: usize, src: &[T]) -> usize where
        T : Clone
    {
        unwrap_or_fail(self.try_insert_multiple_before_from(index, src))
    }

    #[track_caller]
    pub fn add_multiple_to_tail_from(&mut self, src: &[T]) -> usize where
        T : Clone
    {
        unwrap_or_fail(self.try_insert_multiple_before_from(self.len, src))
    }

    /// Append a copy of every element in `other`, returns the index of the first appended element.
    pub fn try_add_vector_to_tail<B2: ArrayBuffer<T>>(&mut self, other: &GenericUtlArray<T, B2>) -> Result<usize, ArrayError> where
        T : Clone
    {
        unsafe { self.insert_multiple_with(self.len, other.len, |k, slot| lifecycle::copy_construct(slot, other.element_unchecked(k))) }
    }

    #[track_caller]
    pub fn add_vector_to_tail<B2: ArrayBuffer<T>>(&mut self, other: &GenericUtlArray<T, B2>) -> usize where
        T : Clone
    {
        unwrap_or_fail(self.try_add_vector_to_tail(other))
    }

    /// Replace the content of the array by copies of the elements in `src`.
    pub fn try_copy_array(&mut self, src: &[T]) -> Result<(), ArrayError> where
        T : Clone
    {
        // Grow up front, so a failure leaves the current elements untouched
        let capacity = self.buf.capacity();
        if src.len() > capacity {
            self.buf.try_grow(src.len() - capacity)?;
        }

        self.remove_all();
        let res = unsafe { self.insert_multiple_with(0, src.len(), |k, slot| lifecycle::copy_construct(slot, &src[k])) };
        res.map(|_| ())
    }

    #[track_caller]
    pub fn copy_array(&mut self, src: &[T]) where
        T : Clone
    {
        unwrap_or_fail(self.try_copy_array(src))
    }

    /// Exchange the content of 2 arrays, without touching any of the elements.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.buf, &mut other.buf);
        mem::swap(&mut self.len, &mut other.len);
    }

    //--------------------------------------------------------------
    // Removal

    /// Remove the element at `index` and return it, the last element is moved into its place.
    ///
    /// This does not preserve the order of the elements, but is *O*(1).
    pub fn try_fast_remove(&mut self, index: usize) -> Result<T, ArrayError> {
        self.check_index(index)?;

        let last = self.len - 1;
        unsafe {
            let value = lifecycle::take(self.buf.slot_mut(index));
            if index != last {
                self.buf.relocate(last, index, 1);
            }
            self.len = last;
            Ok(value)
        }
    }

    #[track_caller]
    pub fn fast_remove(&mut self, index: usize) -> T {
        unwrap_or_fail(self.try_fast_remove(index))
    }

    /// Remove the element at `index` and return it, all elements after it are shifted down to close the gap.
    pub fn try_remove(&mut self, index: usize) -> Result<T, ArrayError> {
        self.check_index(index)?;

        unsafe {
            let value = lifecycle::take(self.buf.slot_mut(index));
            self.buf.relocate(index + 1, index, self.len - index - 1);
            self.len -= 1;
            Ok(value)
        }
    }

    #[track_caller]
    pub fn remove(&mut self, index: usize) -> T {
        unwrap_or_fail(self.try_remove(index))
    }

    /// Remove `num` elements starting at `index`, preserving the order of the remaining elements.
    pub fn try_remove_multiple(&mut self, index: usize, num: usize) -> Result<(), ArrayError> {
        let len = self.len;
        let end = index.checked_add(num)
            .filter(|&end| end <= len)
            .ok_or(ArrayError::RangeOutOfBounds { start: index, count: num, len })?;
        if num == 0 {
            return Ok(());
        }

        // If a destructor panics, the rest of the range is leaked, but the tail still gets shifted into place
        self.len = index;
        let mut guard = scopeguard::guard(self, move |arr| {
            unsafe { arr.buf.relocate(end, index, len - end) };
            arr.len = len - num;
        });

        for i in (index..end).rev() {
            unsafe { lifecycle::destruct(guard.buf.slot_mut(i)) };
        }
        Ok(())
    }

    #[track_caller]
    pub fn remove_multiple(&mut self, index: usize, num: usize) {
        unwrap_or_fail(self.try_remove_multiple(index, num))
    }

    /// Remove all elements, keeping the allocated memory.
    ///
    /// Elements are destroyed back to front.
    pub fn remove_all(&mut self) {
        let len = mem::replace(&mut self.len, 0);
        for i in (0..len).rev() {
            unsafe { lifecycle::destruct(self.buf.slot_mut(i)) };
        }
    }

    /// Remove all elements and release all memory.
    pub fn purge(&mut self) {
        self.remove_all();
        self.buf.purge();
    }

    /// Tear down every element front to back, then release all memory.
    ///
    /// Meant for arrays that own a secondary resource per element, e.g. `Box`es, where teardown order matters.
    pub fn purge_and_delete_elements(&mut self) {
        let len = mem::replace(&mut self.len, 0);
        for i in 0..len {
            unsafe { lifecycle::destruct(self.buf.slot_mut(i)) };
        }
        self.buf.purge();
    }

    //--------------------------------------------------------------
    // Searching

    /// Find the index of the first element equal to `value`.
    pub fn find(&self, value: &T) -> Option<usize> where
        T : PartialEq
    {
        self.iter().position(|elem| elem == value)
    }

    pub fn has_element(&self, value: &T) -> bool where
        T : PartialEq
    {
        self.find(value).is_some()
    }

    /// Remove the first element equal to `value`, preserving order, returns whether an element was removed.
    pub fn find_and_remove(&mut self, value: &T) -> bool where
        T : PartialEq
    {
        match self.find(value) {
            Some(index) => {
                // `index` comes from `find`, so it's valid
                _ = self.try_remove(index);
                true
            },
            None => false,
        }
    }

    //--------------------------------------------------------------
    // Sorting

    /// Sort the array with a comparator, this sort is stable.
    ///
    /// Contiguous storage is sorted in *O*(*n* \* log(*n*)), paged storage falls back to an *O*(*n*^2) exchange sort over logical indices.
    pub fn sort_by<F>(&mut self, mut compare: F) where
        F : FnMut(&T, &T) -> Ordering
    {
        if self.len <= 1 {
            return;
        }

        if B::CONTIGUOUS {
            let elems = unsafe { slice::from_raw_parts_mut(self.buf.slot_mut(0), self.len) };
            elems.sort_by(compare);
            return;
        }

        for i in 1..self.len {
            let mut j = i;
            while j > 0 {
                unsafe {
                    let prev = self.buf.slot_mut(j - 1);
                    let cur = self.buf.slot_mut(j);
                    if compare(&*prev, &*cur) != Ordering::Greater {
                        break;
                    }
                    ptr::swap(prev, cur);
                }
                j -= 1;
            }
        }
    }

    pub fn sort(&mut self) where
        T : Ord
    {
        self.sort_by(T::cmp)
    }
}

impl<T: Default, B: ArrayBuffer<T>> GenericUtlArray<T, B> {
    /// Insert a default constructed element before `index`.
    pub fn try_insert_default_before(&mut self, index: usize) -> Result<usize, ArrayError> {
        self.try_insert_before(index, T::default())
    }

    #[track_caller]
    pub fn insert_default_before(&mut self, index: usize) -> usize {
        unwrap_or_fail(self.try_insert_default_before(index))
    }

    #[track_caller]
    pub fn insert_default_after(&mut self, index: usize) -> usize {
        unwrap_or_fail(self.try_insert_default_before(index.saturating_add(1)))
    }

    #[track_caller]
    pub fn add_default_to_head(&mut self) -> usize {
        unwrap_or_fail(self.try_insert_default_before(0))
    }

    #[track_caller]
    pub fn add_default_to_tail(&mut self) -> usize {
        unwrap_or_fail(self.try_insert_default_before(self.len))
    }

    /// Insert `num` default constructed elements before `index`, in one grow and shift.
    pub fn try_insert_multiple_before(&mut self, index: usize, num: usize) -> Result<usize, ArrayError> {
        unsafe { self.insert_multiple_with(index, num, |_, slot| lifecycle::construct(slot)) }
    }

    #[track_caller]
    pub fn insert_multiple_before(&mut self, index: usize, num: usize) -> usize {
        unwrap_or_fail(self.try_insert_multiple_before(index, num))
    }

    #[track_caller]
    pub fn insert_multiple_after(&mut self, index: usize, num: usize) -> usize {
        unwrap_or_fail(self.try_insert_multiple_before(index.saturating_add(1), num))
    }

    #[track_caller]
    pub fn add_multiple_to_head(&mut self, num: usize) -> usize {
        unwrap_or_fail(self.try_insert_multiple_before(0, num))
    }

    #[track_caller]
    pub fn add_multiple_to_tail(&mut self, num: usize) -> usize {
        unwrap_or_fail(self.try_insert_multiple_before(self.len, num))
    }

    /// Make sure the array holds at least `count` elements, default constructing the missing ones at the tail.
    pub fn try_ensure_count(&mut self, count: usize) -> Result<(), ArrayError> {
        if self.len < count {
            self.try_insert_multiple_before(self.len, count - self.len)?;
        }
        Ok(())
    }

    #[track_caller]
    pub fn ensure_count(&mut self, count: usize) {
        unwrap_or_fail(self.try_ensure_count(count))
    }

    /// Reset the array to exactly `count` default constructed elements.
    pub fn try_set_count(&mut self, count: usize) -> Result<(), ArrayError> {
        let capacity = self.buf.capacity();
        if count > capacity {
            self.buf.try_grow(count - capacity)?;
        }

        self.remove_all();
        self.try_insert_multiple_before(0, count).map(|_| ())
    }

    #[track_caller]
    pub fn set_count(&mut self, count: usize) {
        unwrap_or_fail(self.try_set_count(count))
    }

    #[track_caller]
    pub fn set_size(&mut self, size: usize) {
        unwrap_or_fail(self.try_set_count(size))
    }
}

impl<T, B: InitBuffer<T>> GenericUtlArray<T, B> {
    /// Create an empty array that doubles its capacity when it runs out of space, this does not allocate.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::from_buffer(B::with_grow_size(0))
    }

    #[track_caller]
    pub fn with_grow_size(grow_size: usize, init_size: usize) -> Self {
        Self::with_config(ArrayConfig::new().with_grow_size(grow_size).with_init_size(init_size))
    }

    #[track_caller]
    pub fn with_config(config: ArrayConfig) -> Self {
        unwrap_or_fail(Self::try_with_config(config))
    }

    pub fn try_with_config(config: ArrayConfig) -> Result<Self, ArrayError> {
        let mut buf = B::with_grow_size(config.grow_size);
        if config.init_size > 0 {
            buf.try_ensure_capacity(config.init_size)?;
        }
        Ok(Self::from_buffer(buf))
    }
}

impl<T, B: InitBuffer<T>> Default for GenericUtlArray<T, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, B: ArrayBuffer<T>> Drop for GenericUtlArray<T, B> {
    fn drop(&mut self) {
        // The buffer releases its own memory
        self.remove_all();
    }
}

impl<T, B: ArrayBuffer<T>> Index<usize> for GenericUtlArray<T, B> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &Self::Output {
        self.element(index)
    }
}

impl<T, B: ArrayBuffer<T>> IndexMut<usize> for GenericUtlArray<T, B> {
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.element_mut(index)
    }
}

impl<T: fmt::Debug, B: ArrayBuffer<T>> fmt::Debug for GenericUtlArray<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, B: ArrayBuffer<T>> Extend<T> for GenericUtlArray<T, B> {
    #[track_caller]
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        // Only a hint, running out of space is reported by the insert itself
        _ = self.grow_vector(lower);
        for value in iter {
            self.add_to_tail(value);
        }
    }
}

impl_seq_partial_eq!{ [B: ArrayBuffer<T>, B2: ArrayBuffer<U>] GenericUtlArray<T, B>, GenericUtlArray<U, B2> }
impl_seq_partial_eq!{ [B: ArrayBuffer<T>] GenericUtlArray<T, B>, [U] }
impl_seq_partial_eq!{ [B: ArrayBuffer<T>] GenericUtlArray<T, B>, &[U] }
impl_seq_partial_eq!{ [B: ArrayBuffer<T>, const N: usize] GenericUtlArray<T, B>, [U; N] }

impl<T: Eq, B: ArrayBuffer<T>> Eq for GenericUtlArray<T, B> {}

impl<'a, T, B: ArrayBuffer<T>> IntoIterator for &'a GenericUtlArray<T, B> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T, B: ArrayBuffer<T>> IntoIterator for &'a mut GenericUtlArray<T, B> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

//------------------------------------------------------------------------------------------------------------------------------

/// Iterator over the elements of an array in logical order.
pub struct Iter<'a, T, B: ArrayBuffer<T>> {
    arr   : &'a GenericUtlArray<T, B>,
    front : usize,
    back  : usize,
}

impl<'a, T, B: ArrayBuffer<T>> Iterator for Iter<'a, T, B> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            let elem = unsafe { &*self.arr.buf.slot(self.front) };
            self.front += 1;
            Some(elem)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<'a, T, B: ArrayBuffer<T>> DoubleEndedIterator for Iter<'a, T, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.back -= 1;
            Some(unsafe { &*self.arr.buf.slot(self.back) })
        } else {
            None
        }
    }
}

impl<'a, T, B: ArrayBuffer<T>> ExactSizeIterator for Iter<'a, T, B> {}
impl<'a, T, B: ArrayBuffer<T>> FusedIterator for Iter<'a, T, B> {}

impl<'a, T, B: ArrayBuffer<T>> Clone for Iter<'a, T, B> {
    fn clone(&self) -> Self {
        Self { arr: self.arr, front: self.front, back: self.back }
    }
}

/// Mutable iterator over the elements of an array in logical order.
pub struct IterMut<'a, T, B: ArrayBuffer<T>> {
    arr   : NonNull<GenericUtlArray<T, B>>,
    // Contiguous storage resolves the base once, so no new borrow of the buffer is created while elements are handed out
    base  : Option<NonNull<T>>,
    front : usize,
    back  : usize,
    _p    : PhantomData<&'a mut T>,
}

impl<'a, T, B: ArrayBuffer<T>> IterMut<'a, T, B> {
    fn new(arr: &'a mut GenericUtlArray<T, B>) -> Self {
        let back = arr.len;
        let mut arr = NonNull::from(arr);
        let base = if B::CONTIGUOUS && back > 0 {
            NonNull::new(unsafe { arr.as_mut().buf.slot_mut(0) })
        } else {
            None
        };
        Self { arr, base, front: 0, back, _p: PhantomData }
    }

    /// # Safety
    ///
    /// `index` must be a live index that was not handed out before.
    unsafe fn elem(&mut self, index: usize) -> &'a mut T {
        match self.base {
            Some(base) => &mut *base.as_ptr().add(index),
            None => &mut *(*self.arr.as_ptr()).buf.slot_mut(index),
        }
    }
}

impl<'a, T, B: ArrayBuffer<T>> Iterator for IterMut<'a, T, B> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            let elem = unsafe { self.elem(self.front) };
            self.front += 1;
            Some(elem)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<'a, T, B: ArrayBuffer<T>> DoubleEndedIterator for IterMut<'a, T, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.back -= 1;
            Some(unsafe { self.elem(self.back) })
        } else {
            None
        }
    }
}

impl<'a, T, B: ArrayBuffer<T>> ExactSizeIterator for IterMut<'a, T, B> {}
impl<'a, T, B: ArrayBuffer<T>> FusedIterator for IterMut<'a, T, B> {}

//! In-place element lifecycle.
//!
//! Slots outside of an array's live range are uninitialized memory, these helpers are the only places where a slot
//! goes from uninitialized to live, or back.

use core::ptr;

/// Default-construct an element in `slot`.
///
/// # Safety
///
/// `slot` must be valid for writes, properly aligned and must not contain a live element.
#[inline]
pub(crate) unsafe fn construct<T: Default>(slot: *mut T) {
    ptr::write(slot, T::default());
}

/// Copy-construct an element in `slot` from `src`.
///
/// # Safety
///
/// Same as [`construct`].
#[inline]
pub(crate) unsafe fn copy_construct<T: Clone>(slot: *mut T, src: &T) {
    ptr::write(slot, src.clone());
}

/// Move `value` into `slot`.
///
/// # Safety
///
/// Same as [`construct`].
#[inline]
pub(crate) unsafe fn move_construct<T>(slot: *mut T, value: T) {
    ptr::write(slot, value);
}

/// Move the element out of `slot`, leaving the slot uninitialized.
///
/// # Safety
///
/// `slot` must contain a live element, which must not be used again after this call.
#[inline]
pub(crate) unsafe fn take<T>(slot: *mut T) -> T {
    ptr::read(slot)
}

/// Destruct the element in `slot`, leaving the slot uninitialized.
///
/// # Safety
///
/// Same as [`take`].
#[inline]
pub(crate) unsafe fn destruct<T>(slot: *mut T) {
    ptr::drop_in_place(slot);
}

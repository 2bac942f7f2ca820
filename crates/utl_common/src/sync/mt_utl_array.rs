use core::fmt;
use parking_lot::lock_api::{self, MutexGuard, RawMutex};

/// Guard giving exclusive access to the array inside of a [`MtUtlArray`], the lock is released when it's dropped.
pub type MtUtlArrayGuard<'a, A, R = parking_lot::RawMutex> = MutexGuard<'a, R, A>;

/// An array paired with a mutex.
///
/// None of the array's operations take the lock by themselves, the caller locks the array for as long as a sequence
/// of operations needs to appear atomic to other threads, and gets access to the array through the returned guard.
///
/// ```
/// use utl_common::{collections::UtlArray, sync::MtUtlArray};
///
/// let arr = MtUtlArray::new(UtlArray::new());
/// {
///     let mut guard = arr.lock();
///     guard.add_to_tail(1);
///     guard.add_to_tail(2);
/// }
/// assert_eq!(*arr.lock(), [1, 2]);
/// ```
pub struct MtUtlArray<A, R: RawMutex = parking_lot::RawMutex> {
    inner: lock_api::Mutex<R, A>,
}

impl<A> MtUtlArray<A> {
    pub const fn new(arr: A) -> Self {
        Self::from_raw(<parking_lot::RawMutex as RawMutex>::INIT, arr)
    }
}

impl<A, R: RawMutex> MtUtlArray<A, R> {
    /// Pair an array with a custom raw mutex.
    pub const fn from_raw(raw_mutex: R, arr: A) -> Self {
        Self { inner: lock_api::Mutex::const_new(raw_mutex, arr) }
    }

    /// Lock the array, blocking the current thread until the lock can be acquired.
    #[inline]
    pub fn lock(&self) -> MtUtlArrayGuard<'_, A, R> {
        self.inner.lock()
    }

    /// Try to lock the array without blocking, returns `None` when it's already locked.
    #[inline]
    pub fn try_lock(&self) -> Option<MtUtlArrayGuard<'_, A, R>> {
        self.inner.try_lock()
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Get access to the array without locking, exclusive access is already guaranteed by the mutable borrow.
    #[inline]
    pub fn get_mut(&mut self) -> &mut A {
        self.inner.get_mut()
    }

    #[inline]
    pub fn into_inner(self) -> A {
        self.inner.into_inner()
    }

    /// Get the underlying raw mutex.
    ///
    /// # Safety
    ///
    /// The caller must not unlock the mutex while a guard for it is still alive.
    #[inline]
    pub unsafe fn raw_mutex(&self) -> &R {
        self.inner.raw()
    }
}

impl<A: Default, R: RawMutex> Default for MtUtlArray<A, R> {
    fn default() -> Self {
        Self::from_raw(R::INIT, A::default())
    }
}

impl<A, R: RawMutex> From<A> for MtUtlArray<A, R> {
    fn from(arr: A) -> Self {
        Self::from_raw(R::INIT, arr)
    }
}

impl<A: fmt::Debug, R: RawMutex> fmt::Debug for MtUtlArray<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MtUtlArray").field("inner", &self.inner).finish()
    }
}

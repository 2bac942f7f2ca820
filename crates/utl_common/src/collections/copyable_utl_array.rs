use core::{
    fmt,
    ops::{Deref, DerefMut},
};

use super::{ArrayConfig, UtlArray};

/// A [`UtlArray`] with value semantics, cloning it performs a deep copy of every element.
///
/// Meant to be nested by value inside other containers that need to be cloned themselves.
pub struct CopyableUtlArray<T>(UtlArray<T>);

impl<T> CopyableUtlArray<T> {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(UtlArray::new())
    }

    #[track_caller]
    pub fn with_grow_size(grow_size: usize, init_size: usize) -> Self {
        Self(UtlArray::with_grow_size(grow_size, init_size))
    }

    #[track_caller]
    pub fn with_config(config: ArrayConfig) -> Self {
        Self(UtlArray::with_config(config))
    }

    pub fn into_inner(self) -> UtlArray<T> {
        self.0
    }
}

impl<T> From<UtlArray<T>> for CopyableUtlArray<T> {
    fn from(arr: UtlArray<T>) -> Self {
        Self(arr)
    }
}

impl<T> Default for CopyableUtlArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for CopyableUtlArray<T> {
    type Target = UtlArray<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for CopyableUtlArray<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: Clone> Clone for CopyableUtlArray<T> {
    #[track_caller]
    fn clone(&self) -> Self {
        let mut arr = UtlArray::with_grow_size(self.0.grow_size(), 0);
        arr.copy_array(self.0.as_slice().unwrap_or_default());
        Self(arr)
    }

    /// Reuses the existing allocation when it is large enough.
    #[track_caller]
    fn clone_from(&mut self, source: &Self) {
        self.0.copy_array(source.0.as_slice().unwrap_or_default());
    }
}

impl<T: fmt::Debug> fmt::Debug for CopyableUtlArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl<T: PartialEq> PartialEq for CopyableUtlArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: Eq> Eq for CopyableUtlArray<T> {}

mod error;
mod lifecycle;
mod imp;

mod utl_array;
mod fixed_utl_array;
mod fixed_growable_utl_array;
mod block_utl_array;
mod external_utl_array;
mod copyable_utl_array;

pub use error::*;
pub use imp::utl_array::{ArrayBuffer, InitBuffer, GenericUtlArray, ArrayDiagnostics, Iter, IterMut};

pub use utl_array::*;
pub use fixed_utl_array::*;
pub use fixed_growable_utl_array::*;
pub use block_utl_array::*;
pub use external_utl_array::*;
pub use copyable_utl_array::*;

#[cfg(test)]
mod tests;

//--------------------------------------------------------------

/// Construction-time configuration of an array.
///
/// `grow_size` is the number of elements the storage grows by when it runs out of space, a grow size of `0` means
/// "double the current capacity, with a minimum of 1". Block storage uses it as its page length instead.
///
/// `init_size` is the capacity the storage is created with.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct ArrayConfig {
    pub grow_size: usize,
    pub init_size: usize,
}

impl ArrayConfig {
    pub const fn new() -> Self {
        Self { grow_size: 0, init_size: 0 }
    }

    pub const fn with_grow_size(mut self, grow_size: usize) -> Self {
        self.grow_size = grow_size;
        self
    }

    pub const fn with_init_size(mut self, init_size: usize) -> Self {
        self.init_size = init_size;
        self
    }

    /// Calculate the capacity to grow to when `required` slots are needed and only `current` are available.
    pub fn calc_capacity(&self, current: usize, required: usize) -> Result<usize, ArrayError> {
        calc_grow_capacity(self.grow_size, current, required)
    }
}

/// Growth policy shared by all growable buffers.
///
/// - `grow_size == 0`: the larger of `required` and double the current capacity (minimum 1).
/// - otherwise: the current capacity plus the smallest multiple of `grow_size` that covers `required`.
pub fn calc_grow_capacity(grow_size: usize, current: usize, required: usize) -> Result<usize, ArrayError> {
    if required <= current {
        return Ok(current);
    }

    let new_cap = if grow_size == 0 {
        let doubled = current.checked_mul(2).ok_or(ArrayError::CapacityOverflow)?.max(1);
        doubled.max(required)
    } else {
        let steps = (required - current).div_ceil(grow_size);
        steps.checked_mul(grow_size)
            .and_then(|extra| current.checked_add(extra))
            .ok_or(ArrayError::CapacityOverflow)?
    };

    if new_cap > isize::MAX as usize {
        Err(ArrayError::CapacityOverflow)
    } else {
        Ok(new_cap)
    }
}

//--------------------------------------------------------------

macro_rules! impl_seq_partial_eq {
    ([$($vars:tt)*] $lhs:ty, $rhs:ty) => {
        impl<T, U, $($vars)*> PartialEq<$rhs> for $lhs where
            T : PartialEq<U>
        {
            #[inline]
            fn eq(&self, other: &$rhs) -> bool {
                self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
            }
        }
    };
}
use impl_seq_partial_eq;

static_assertions::assert_impl_all!(UtlArray<u32>: Send, Sync);
static_assertions::assert_impl_all!(FixedUtlArray<u32, 4>: Send, Sync);
static_assertions::assert_impl_all!(FixedGrowableUtlArray<u32, 4>: Send, Sync);
static_assertions::assert_impl_all!(BlockUtlArray<u32>: Send, Sync);
static_assertions::assert_impl_all!(ExternalUtlArray<'static, u32>: Send, Sync);
static_assertions::assert_not_impl_any!(UtlArray<std::rc::Rc<u32>>: Send, Sync);
static_assertions::assert_not_impl_any!(BlockUtlArray<std::rc::Rc<u32>>: Send, Sync);

//! Synchronization wrappers for the collections.
//!
//! The arrays in [`collections`](crate::collections) have no internal synchronization at all, sharing one between
//! threads requires an external lock around every sequence of operations that needs to appear atomic.

mod mt_utl_array;

pub use mt_utl_array::*;

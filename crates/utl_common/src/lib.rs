//! Index-addressed growable arrays with pluggable storage.
//!
//! All array flavours share one set of algorithms ([`collections::GenericUtlArray`]) and only differ in the
//! [`collections::ArrayBuffer`] that backs them: a contiguous heap buffer, a fixed inline buffer, a fixed inline buffer
//! that spills to the heap, a buffer of same-size pages, or caller-provided memory.
//!
//! Elements must always be referred to by index, any mutating call may move them to another address.

pub mod collections;
pub mod sync;

use utl_logging::LogCategory;

pub(crate) const LOG_CAT : LogCategory = LogCategory::new("Collections");

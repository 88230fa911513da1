//! A growable, contiguous array built directly on raw memory.
//!
//! [`RawStorage`] owns one uninitialized block and nothing else.
//! [`DynamicArray`] sits on top of it, tracks which slots are live, and
//! carries the failure guarantees of every operation.

#[macro_use]

mod macros;
mod errors;
mod global_alloc;
mod iter;

pub mod capacity_policy;
pub mod raw_storage;
pub mod dynamic_array;

pub use errors::{CapacityError, ElementError};
pub use global_alloc::{GlobalAlloc, GLOBAL_ALLOC};
pub use capacity_policy::{CapacityPolicy, Doubling, Fixed};
pub use raw_storage::RawStorage;
pub use dynamic_array::DynamicArray;
pub use iter::{Iter, IterMut, IntoIter};

pub type Result<T> = core::result::Result<T, CapacityError>;

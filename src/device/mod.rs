//! Host-side device models.
//!
//! The coprocessor reaches host memory through the
//! [`Memory`](crate::interpreter::traits::Memory) trait. [`HostMemory`] is
//! the in-process implementation used by tests and by embedders that do not
//! bring their own MMU.

pub mod host_memory;

pub use host_memory::{HostMemory, HostMemoryError, MemoryRegion};

//! Windows backend
//!
//! All unsafe FFI is contained in [`bindings`]; [`WindowsMemory`] exposes it
//! through the [`MemorySource`](crate::memory::MemorySource) trait.

pub mod bindings;
pub mod enumerator;
pub mod source;
pub mod types;
pub mod utils;

pub use enumerator::{enumerate_processes, ProcessEnumerator};
pub use source::WindowsMemory;
pub use types::Handle;

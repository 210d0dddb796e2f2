//! Memory sources for reading another process's address space
//!
//! A [`MemorySource`] performs raw, exact-length reads. Everything above it
//! (typed reads, pointer width, statistics) lives on
//! [`RemoteProcess`](crate::process::RemoteProcess).
//!
//! Backends:
//! - Windows: `ReadProcessMemory` through [`crate::windows::WindowsMemory`]
//! - Linux: `/proc/<pid>/mem` through [`crate::linux::ProcMemory`]
//! - [`MockMemory`]: an in-memory address space for tests

pub mod mock;

pub use mock::MockMemory;

use crate::core::types::{Address, MirrorResult, ModuleInfo};

/// Read-only access to a target address space
pub trait MemorySource: Send + Sync {
    /// Fills `buffer` from `address`. A short read is an error, never a partial success.
    fn read_exact(&self, address: Address, buffer: &mut [u8]) -> MirrorResult<()>;

    /// Modules currently mapped in the target
    fn modules(&self) -> MirrorResult<Vec<ModuleInfo>>;

    /// Whether the target is still running
    fn is_alive(&self) -> bool;
}

impl<T: MemorySource + ?Sized> MemorySource for Box<T> {
    fn read_exact(&self, address: Address, buffer: &mut [u8]) -> MirrorResult<()> {
        (**self).read_exact(address, buffer)
    }

    fn modules(&self) -> MirrorResult<Vec<ModuleInfo>> {
        (**self).modules()
    }

    fn is_alive(&self) -> bool {
        (**self).is_alive()
    }
}

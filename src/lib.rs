//! hearth-mirror: read-only reflection over a running Mono game client
//!
//! Layers, from the bottom up:
//! - [`memory`] and [`process`]: exact reads from another address space
//! - [`runtime`]: finding the Mono runtime and the game assembly
//! - [`metadata`]: class descriptors read from the runtime's own metadata
//! - [`walker`]: metadata-driven decoding of object graphs into [`RemoteValue`] trees
//! - [`query`]: typed game queries behind the [`Mirror`] facade

pub mod config;
pub mod core;
pub mod memory;
pub mod metadata;
pub mod process;
pub mod query;
pub mod runtime;
pub mod session;
pub mod walker;

#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(windows)]
pub mod windows;

pub use crate::config::Config;
pub use crate::core::types::{
    Address, DecodeFailure, MirrorError, MirrorResult, ModuleInfo, ProcessArchitecture, ProcessId,
    ProcessInfo, RemoteObject, RemoteValue, Scalar,
};
pub use crate::core::{AUTHORS, VERSION};
pub use crate::memory::{MemorySource, MockMemory};
pub use crate::process::RemoteProcess;
pub use crate::query::Mirror;
pub use crate::session::Session;

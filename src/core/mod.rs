//! Core module containing fundamental types for hearth-mirror
//!
//! Address handling, mirrored values, process information and error types
//! shared by every layer from the memory sources up to the query facade.

pub mod types;

pub use types::{
    Address, MirrorError, MirrorResult, ModuleInfo, ProcessArchitecture, ProcessInfo, RemoteObject,
    RemoteValue, Scalar,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

//! Core type definitions for hearth-mirror
//!
//! Address wrappers, decoded remote values, process information and the
//! crate-wide error type.

mod address;
mod error;
mod process_info;
mod value;

pub use address::Address;
pub use error::{MirrorError, MirrorResult};
pub use process_info::{ModuleInfo, ProcessArchitecture, ProcessInfo};
pub use value::{DecodeFailure, RemoteObject, RemoteValue, Scalar};

pub type ProcessId = u32;

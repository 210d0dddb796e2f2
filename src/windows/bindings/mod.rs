//! Windows API bindings
//!
//! Thin safe wrappers over the few Win32 calls a read-only attach needs.

pub mod kernel32;
pub mod ntdll;
pub mod psapi;

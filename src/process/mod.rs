//! Target process discovery and read access
//!
//! [`RemoteProcess`] is the read-capable handle every other layer goes through.
//! Process lookup dispatches to the platform backend.

pub mod enumerator;
pub mod handle;

pub use enumerator::{enumerate_processes, find_process_by_name, find_processes_by_name};
pub use handle::{ReadStats, RemoteProcess};

//! Managed runtime discovery
//!
//! Finds the Mono module in the target, decodes its export table to reach the
//! loaded-assembly list and matches the game assembly. The result is a
//! [`RuntimeImage`] holding the layout profile every later read uses.

pub mod layout;
pub mod locator;
pub mod pe;

pub use layout::{RuntimeLayout, RuntimeVersion, StaticStorage};
pub use locator::{assembly_names, detect_version, locate, locate_with_retry, RuntimeImage};

//! Remote type metadata
//!
//! Types are found by name in the game image's class cache and described
//! from the runtime's own `MonoClass` and `MonoClassField` records, so field
//! offsets always come from the running binary.

pub mod catalog;
pub mod descriptor;
pub mod tag;

pub use catalog::MetadataCatalog;
pub use descriptor::{FieldDescriptor, TypeDescriptor, TypeKind};
pub use tag::TypeTag;

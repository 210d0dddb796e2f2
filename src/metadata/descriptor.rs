//! Resolved type shapes

use super::tag::TypeTag;
use crate::core::types::Address;

/// How instances of a class are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// Heap object reached through a pointer
    Reference,
    /// Struct stored inline
    ValueType,
    /// Enum stored inline as its underlying integer
    Enum(TypeTag),
    /// Array class (`rank > 0`)
    Array,
}

/// One field of a class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    /// Byte offset from the object start (header included) or into static storage
    pub offset: usize,
    pub tag: TypeTag,
    /// `MonoType.data`: the class for class and value-type tags
    pub type_data: Address,
    pub is_static: bool,
    /// Compile-time constant with no storage
    pub is_literal: bool,
    /// Thread or context static; stored per thread, not in the class's static block
    pub is_special_static: bool,
    /// Class that declares the field
    pub owner: Address,
}

/// A class resolved from the runtime's metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub class: Address,
    pub name: String,
    pub namespace: String,
    pub parent: Option<Address>,
    /// Parent chain, nearest first
    pub ancestors: Vec<Address>,
    pub kind: TypeKind,
    pub instance_size: usize,
    pub rank: u8,
    pub element_class: Option<Address>,
    /// Primitive tag when this is a `System` primitive type
    pub primitive: Option<TypeTag>,
    /// Declared fields, most-derived class first
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    /// `Namespace.Name`, or just the name for the global namespace
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// First field with this exact name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn instance_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.is_static && !f.is_literal)
    }

    /// True for the class itself or any ancestor
    pub fn derives_from(&self, class: Address) -> bool {
        self.class == class || self.ancestors.contains(&class)
    }

    /// Matches either the full or the bare name
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name || self.full_name() == name
    }

    /// Generic definitions carry their arity, e.g. ``List`1``
    pub fn generic_name(&self) -> &str {
        self.name.split('`').next().unwrap_or(&self.name)
    }

    pub fn is_array(&self) -> bool {
        self.kind == TypeKind::Array
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.kind, TypeKind::ValueType | TypeKind::Enum(_))
    }
}

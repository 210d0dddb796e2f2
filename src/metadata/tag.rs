//! `MonoTypeEnum` element tags

use std::fmt;

/// Declared type of a field as recorded in `MonoType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Void,
    Boolean,
    Char,
    I1,
    U1,
    I2,
    U2,
    I4,
    U4,
    I8,
    U8,
    R4,
    R8,
    String,
    Ptr,
    ValueType,
    Class,
    Var,
    Array,
    GenericInst,
    I,
    U,
    Object,
    SzArray,
    MVar,
    Other(u8),
}

impl TypeTag {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x01 => TypeTag::Void,
            0x02 => TypeTag::Boolean,
            0x03 => TypeTag::Char,
            0x04 => TypeTag::I1,
            0x05 => TypeTag::U1,
            0x06 => TypeTag::I2,
            0x07 => TypeTag::U2,
            0x08 => TypeTag::I4,
            0x09 => TypeTag::U4,
            0x0A => TypeTag::I8,
            0x0B => TypeTag::U8,
            0x0C => TypeTag::R4,
            0x0D => TypeTag::R8,
            0x0E => TypeTag::String,
            0x0F => TypeTag::Ptr,
            0x11 => TypeTag::ValueType,
            0x12 => TypeTag::Class,
            0x13 => TypeTag::Var,
            0x14 => TypeTag::Array,
            0x15 => TypeTag::GenericInst,
            0x18 => TypeTag::I,
            0x19 => TypeTag::U,
            0x1C => TypeTag::Object,
            0x1D => TypeTag::SzArray,
            0x1E => TypeTag::MVar,
            other => TypeTag::Other(other),
        }
    }

    pub fn to_raw(self) -> u8 {
        match self {
            TypeTag::Void => 0x01,
            TypeTag::Boolean => 0x02,
            TypeTag::Char => 0x03,
            TypeTag::I1 => 0x04,
            TypeTag::U1 => 0x05,
            TypeTag::I2 => 0x06,
            TypeTag::U2 => 0x07,
            TypeTag::I4 => 0x08,
            TypeTag::U4 => 0x09,
            TypeTag::I8 => 0x0A,
            TypeTag::U8 => 0x0B,
            TypeTag::R4 => 0x0C,
            TypeTag::R8 => 0x0D,
            TypeTag::String => 0x0E,
            TypeTag::Ptr => 0x0F,
            TypeTag::ValueType => 0x11,
            TypeTag::Class => 0x12,
            TypeTag::Var => 0x13,
            TypeTag::Array => 0x14,
            TypeTag::GenericInst => 0x15,
            TypeTag::I => 0x18,
            TypeTag::U => 0x19,
            TypeTag::Object => 0x1C,
            TypeTag::SzArray => 0x1D,
            TypeTag::MVar => 0x1E,
            TypeTag::Other(raw) => raw,
        }
    }

    /// Size of a primitive value; pointer-sized tags use `pointer_size`
    pub fn primitive_size(self, pointer_size: usize) -> Option<usize> {
        match self {
            TypeTag::Boolean | TypeTag::I1 | TypeTag::U1 => Some(1),
            TypeTag::Char | TypeTag::I2 | TypeTag::U2 => Some(2),
            TypeTag::I4 | TypeTag::U4 | TypeTag::R4 => Some(4),
            TypeTag::I8 | TypeTag::U8 | TypeTag::R8 => Some(8),
            TypeTag::I | TypeTag::U | TypeTag::Ptr => Some(pointer_size),
            _ => None,
        }
    }

    /// Always stored as a pointer to a managed object
    ///
    /// `GenericInst` is excluded: a generic value type is stored inline.
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            TypeTag::String
                | TypeTag::Class
                | TypeTag::Object
                | TypeTag::Array
                | TypeTag::SzArray
        )
    }

    /// Primitive tag for a `System` value type name
    pub fn for_system_type(name: &str) -> Option<Self> {
        let tag = match name {
            "Boolean" => TypeTag::Boolean,
            "Char" => TypeTag::Char,
            "SByte" => TypeTag::I1,
            "Byte" => TypeTag::U1,
            "Int16" => TypeTag::I2,
            "UInt16" => TypeTag::U2,
            "Int32" => TypeTag::I4,
            "UInt32" => TypeTag::U4,
            "Int64" => TypeTag::I8,
            "UInt64" => TypeTag::U8,
            "Single" => TypeTag::R4,
            "Double" => TypeTag::R8,
            "String" => TypeTag::String,
            "IntPtr" => TypeTag::I,
            "UIntPtr" => TypeTag::U,
            "Object" => TypeTag::Object,
            _ => return None,
        };
        Some(tag)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Other(raw) => write!(f, "0x{:02X}", raw),
            tag => write!(f, "{:?}", tag),
        }
    }
}

//! Decoded values mirrored out of the target process

use super::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A primitive value read from a single field or element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Scalar {
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    /// Native-sized integer or raw pointer
    Native(u64),
}

impl Scalar {
    /// Widens any integral scalar to i64
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Scalar::Bool(v) => Some(v as i64),
            Scalar::Char(v) => Some(v as i64),
            Scalar::I8(v) => Some(v as i64),
            Scalar::I16(v) => Some(v as i64),
            Scalar::I32(v) => Some(v as i64),
            Scalar::I64(v) => Some(v),
            Scalar::U8(v) => Some(v as i64),
            Scalar::U16(v) => Some(v as i64),
            Scalar::U32(v) => Some(v as i64),
            Scalar::U64(v) | Scalar::Native(v) => Some(v as i64),
            Scalar::F32(_) | Scalar::F64(_) => None,
        }
    }

    /// Unsigned view of integral scalars, reinterpreting the bits of signed ones
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Scalar::U64(v) | Scalar::Native(v) => Some(v),
            Scalar::I64(v) => Some(v as u64),
            _ => self.as_i64().map(|v| v as u64),
        }
    }

    /// Floating-point view of numeric scalars
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Scalar::F32(v) => Some(v as f64),
            Scalar::F64(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Scalar::Bool(v) => Some(v),
            _ => self.as_i64().map(|v| v != 0),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{}", v),
            Scalar::Char(v) => write!(f, "{:?}", v),
            Scalar::I8(v) => write!(f, "{}", v),
            Scalar::I16(v) => write!(f, "{}", v),
            Scalar::I32(v) => write!(f, "{}", v),
            Scalar::I64(v) => write!(f, "{}", v),
            Scalar::U8(v) => write!(f, "{}", v),
            Scalar::U16(v) => write!(f, "{}", v),
            Scalar::U32(v) => write!(f, "{}", v),
            Scalar::U64(v) => write!(f, "{}", v),
            Scalar::F32(v) => write!(f, "{}", v),
            Scalar::F64(v) => write!(f, "{}", v),
            Scalar::Native(v) => write!(f, "0x{:X}", v),
        }
    }
}

/// Why a subtree could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    pub address: Address,
    pub reason: String,
}

impl DecodeFailure {
    pub fn new(address: Address, reason: impl Into<String>) -> Self {
        DecodeFailure {
            address,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.address, self.reason)
    }
}

/// A decoded object or inline value type with its fields in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteObject {
    /// Namespace-qualified class name of the concrete type
    pub class_name: String,
    pub address: Address,
    pub fields: Vec<(String, RemoteValue)>,
}

impl RemoteObject {
    pub fn new(class_name: impl Into<String>, address: Address) -> Self {
        RemoteObject {
            class_name: class_name.into(),
            address,
            fields: Vec::new(),
        }
    }

    /// Looks up a decoded field; the most-derived declaration wins
    pub fn field(&self, name: &str) -> Option<&RemoteValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Short class name without the namespace
    pub fn short_name(&self) -> &str {
        self.class_name
            .rsplit_once('.')
            .map(|(_, name)| name)
            .unwrap_or(&self.class_name)
    }
}

/// One node of a mirrored object graph
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteValue {
    Null,
    Scalar(Scalar),
    String(String),
    Sequence(Vec<RemoteValue>),
    Object(Arc<RemoteObject>),
    Enum { type_name: String, value: i64 },
    Failed(DecodeFailure),
}

impl RemoteValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RemoteValue::Null)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RemoteValue::Failed(_))
    }

    pub fn as_object(&self) -> Option<&RemoteObject> {
        match self {
            RemoteValue::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RemoteValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[RemoteValue]> {
        match self {
            RemoteValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Integral view of scalars and enum values
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RemoteValue::Scalar(scalar) => scalar.as_i64(),
            RemoteValue::Enum { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RemoteValue::Scalar(scalar) => scalar.as_bool(),
            _ => None,
        }
    }

    /// Counts failed nodes anywhere in this subtree
    pub fn failure_count(&self) -> usize {
        match self {
            RemoteValue::Failed(_) => 1,
            RemoteValue::Sequence(items) => items.iter().map(RemoteValue::failure_count).sum(),
            RemoteValue::Object(object) => object
                .fields
                .iter()
                .map(|(_, value)| value.failure_count())
                .sum(),
            _ => 0,
        }
    }
}

impl From<Scalar> for RemoteValue {
    fn from(scalar: Scalar) -> Self {
        RemoteValue::Scalar(scalar)
    }
}

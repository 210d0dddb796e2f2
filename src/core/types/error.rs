//! Error types for hearth-mirror

use crate::config::ConfigError;
use std::fmt;
use thiserror::Error;

/// Main error type for attaching, locating, resolving and decoding
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Failed to attach to target: {0}")]
    AttachFailed(String),

    #[error("Runtime not ready: {0}")]
    NotReady(String),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Unknown field {field} on {type_name}")]
    UnknownField { type_name: String, field: String },

    #[error("Failed to read memory at {address}: {reason}")]
    ReadFailed { address: String, reason: String },

    #[error("Partial read at {address}: expected {expected} bytes, got {actual}")]
    PartialRead {
        address: String,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to decode value at {address}: {reason}")]
    DecodeFailed { address: String, reason: String },

    #[error("Not available: {0}")]
    NotAvailable(String),

    #[error("String at {address} too long: {length} exceeds {max}")]
    StringTooLong {
        address: String,
        length: i64,
        max: usize,
    },

    #[error("Sequence at {address} too long: {length} exceeds {max}")]
    SequenceTooLong {
        address: String,
        length: u64,
        max: usize,
    },

    #[error("Recursion limit reached at depth {depth}")]
    RecursionLimit { depth: usize },

    #[error("Invalid PE image: {0}")]
    InvalidPe(String),

    #[error("Unsupported runtime: {0}")]
    UnsupportedRuntime(String),

    #[error("Invalid memory address: {0}")]
    InvalidAddress(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    Windows(#[from] ::windows::core::Error),
}

/// Result type alias used throughout the crate
pub type MirrorResult<T> = Result<T, MirrorError>;

impl MirrorError {
    /// Creates a Windows API error from the calling thread's last error code
    #[cfg(windows)]
    pub fn last_os_error() -> Self {
        MirrorError::Windows(::windows::core::Error::from_win32())
    }

    /// Creates an attach failure
    pub fn attach_failed(reason: impl Into<String>) -> Self {
        MirrorError::AttachFailed(reason.into())
    }

    /// Creates a not-ready error
    pub fn not_ready(reason: impl Into<String>) -> Self {
        MirrorError::NotReady(reason.into())
    }

    /// Creates a read failed error
    pub fn read_failed(address: impl fmt::Display, reason: impl Into<String>) -> Self {
        MirrorError::ReadFailed {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates a partial read error
    pub fn partial_read(address: impl fmt::Display, expected: usize, actual: usize) -> Self {
        MirrorError::PartialRead {
            address: address.to_string(),
            expected,
            actual,
        }
    }

    /// Creates a decode failed error
    pub fn decode_failed(address: impl fmt::Display, reason: impl Into<String>) -> Self {
        MirrorError::DecodeFailed {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// Creates an unknown field error
    pub fn unknown_field(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        MirrorError::UnknownField {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    /// Creates a not-available error
    pub fn not_available(reason: impl Into<String>) -> Self {
        MirrorError::NotAvailable(reason.into())
    }

    /// Creates an invalid PE error
    pub fn invalid_pe(reason: impl Into<String>) -> Self {
        MirrorError::InvalidPe(reason.into())
    }

    /// The runtime may become ready later; polling again can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, MirrorError::NotReady(_))
    }

    /// Localized failure of one part of an object graph
    pub fn is_subtree_failure(&self) -> bool {
        matches!(
            self,
            MirrorError::ReadFailed { .. }
                | MirrorError::PartialRead { .. }
                | MirrorError::DecodeFailed { .. }
                | MirrorError::StringTooLong { .. }
                | MirrorError::SequenceTooLong { .. }
                | MirrorError::RecursionLimit { .. }
        )
    }

    /// Data that is unreadable or not there yet; queries degrade to an empty result
    pub fn is_missing_data(&self) -> bool {
        self.is_subtree_failure() || matches!(self, MirrorError::NotAvailable(_))
    }

    /// The session is unusable and must be re-established
    pub fn is_fatal(&self) -> bool {
        matches!(self, MirrorError::AttachFailed(_))
    }
}

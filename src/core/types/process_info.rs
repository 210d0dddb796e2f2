//! Process and module information types

use super::{Address, ProcessId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Information about a running process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: ProcessId,
    pub name: String,
    pub path: Option<PathBuf>,
    pub architecture: ProcessArchitecture,
}

impl ProcessInfo {
    /// Creates a new ProcessInfo with minimal information
    pub fn new(pid: ProcessId, name: String) -> Self {
        ProcessInfo {
            pid,
            name,
            path: None,
            architecture: ProcessArchitecture::Unknown,
        }
    }

    /// Case-insensitive name match that ignores a trailing `.exe`
    pub fn name_matches(&self, name: &str) -> bool {
        fn stem(s: &str) -> String {
            let lower = s.trim().to_ascii_lowercase();
            match lower.strip_suffix(".exe") {
                Some(stem) => stem.to_string(),
                None => lower,
            }
        }
        stem(&self.name) == stem(name)
    }
}

/// Process architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessArchitecture {
    X86,
    X64,
    Unknown,
}

impl ProcessArchitecture {
    /// Returns the pointer size for this architecture
    pub fn pointer_size(&self) -> usize {
        match self {
            ProcessArchitecture::X86 => 4,
            ProcessArchitecture::X64 => 8,
            ProcessArchitecture::Unknown => std::mem::size_of::<usize>(),
        }
    }

    /// Architecture matching a pointer width in bytes
    pub fn from_pointer_size(size: usize) -> Self {
        match size {
            4 => ProcessArchitecture::X86,
            8 => ProcessArchitecture::X64,
            _ => ProcessArchitecture::Unknown,
        }
    }

    /// Checks if this is a 64-bit architecture
    pub fn is_64bit(&self) -> bool {
        matches!(self, ProcessArchitecture::X64)
    }
}

impl fmt::Display for ProcessArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessArchitecture::X86 => write!(f, "x86"),
            ProcessArchitecture::X64 => write!(f, "x64"),
            ProcessArchitecture::Unknown => write!(f, "unknown"),
        }
    }
}

/// Information about a loaded module in a process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    pub name: String,
    pub path: PathBuf,
    pub base_address: Address,
    pub size: usize,
}

impl ModuleInfo {
    /// Creates a new ModuleInfo
    pub fn new(name: impl Into<String>, base_address: Address, size: usize) -> Self {
        ModuleInfo {
            name: name.into(),
            path: PathBuf::new(),
            base_address,
            size,
        }
    }

    /// Gets the end address of the module
    pub fn end_address(&self) -> Address {
        self.base_address + self.size
    }

    /// Checks if an address is within this module
    pub fn contains_address(&self, address: Address) -> bool {
        address >= self.base_address && address < self.end_address()
    }

    /// Case-insensitive module name comparison
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

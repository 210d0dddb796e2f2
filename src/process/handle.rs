//! An attached, read-only target process

use crate::core::types::{
    Address, MirrorError, MirrorResult, ModuleInfo, ProcessArchitecture, ProcessId, ProcessInfo,
};
use crate::memory::MemorySource;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

const C_STRING_CHUNK: usize = 64;

/// Counters for reads issued against one process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub reads: u64,
    pub bytes_read: u64,
    pub failures: u64,
}

#[derive(Debug, Default)]
struct ReadCounters {
    reads: AtomicU64,
    bytes_read: AtomicU64,
    failures: AtomicU64,
}

/// A live target process behind a [`MemorySource`] backend
pub struct RemoteProcess {
    pid: ProcessId,
    name: String,
    architecture: ProcessArchitecture,
    base_address: Address,
    source: Box<dyn MemorySource>,
    counters: ReadCounters,
}

impl RemoteProcess {
    /// Wraps an already opened memory source
    pub fn from_source(info: ProcessInfo, source: impl MemorySource + 'static) -> Self {
        let base_address = source
            .modules()
            .ok()
            .and_then(|modules| {
                modules
                    .iter()
                    .find(|m| info.name_matches(&m.name))
                    .or_else(|| modules.first())
                    .map(|m| m.base_address)
            })
            .unwrap_or_default();

        RemoteProcess {
            pid: info.pid,
            name: info.name,
            architecture: info.architecture,
            base_address,
            source: Box::new(source),
            counters: ReadCounters::default(),
        }
    }

    /// Finds a running process by name and opens it for reading
    pub fn attach(process_name: &str) -> MirrorResult<Self> {
        let info = super::find_process_by_name(process_name)?.ok_or_else(|| {
            MirrorError::attach_failed(format!("process {} is not running", process_name))
        })?;
        Self::open(info)
    }

    /// Opens a known process with the platform backend
    pub fn open(info: ProcessInfo) -> MirrorResult<Self> {
        #[cfg(windows)]
        let opened = crate::windows::WindowsMemory::open(info.pid).map(|source| {
            let architecture = source.architecture();
            (source, architecture)
        });

        #[cfg(target_os = "linux")]
        let opened = crate::linux::ProcMemory::open(info.pid).map(|source| {
            let architecture = source.architecture();
            (source, architecture)
        });

        #[cfg(not(any(windows, target_os = "linux")))]
        let opened: MirrorResult<(crate::memory::MockMemory, ProcessArchitecture)> = Err(
            MirrorError::UnsupportedRuntime("no memory backend for this platform".to_string()),
        );

        let (source, architecture) = opened.map_err(|e| {
            MirrorError::attach_failed(format!("cannot open pid {}: {}", info.pid, e))
        })?;

        let mut info = info;
        if info.architecture == ProcessArchitecture::Unknown {
            info.architecture = architecture;
        }
        info!(
            pid = info.pid,
            name = %info.name,
            architecture = %info.architecture,
            "Attached to target process"
        );
        Ok(Self::from_source(info, source))
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn architecture(&self) -> ProcessArchitecture {
        self.architecture
    }

    /// Base address of the main module, or null when it could not be determined
    pub fn base_address(&self) -> Address {
        self.base_address
    }

    pub fn pointer_size(&self) -> usize {
        self.architecture.pointer_size()
    }

    pub fn is_alive(&self) -> bool {
        self.source.is_alive()
    }

    pub fn modules(&self) -> MirrorResult<Vec<ModuleInfo>> {
        self.source.modules()
    }

    /// Finds a loaded module by case-insensitive name
    pub fn find_module(&self, name: &str) -> MirrorResult<Option<ModuleInfo>> {
        Ok(self.modules()?.into_iter().find(|m| m.is_named(name)))
    }

    pub fn stats(&self) -> ReadStats {
        ReadStats {
            reads: self.counters.reads.load(Ordering::Relaxed),
            bytes_read: self.counters.bytes_read.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    /// Fills `buffer` exactly from `address`
    pub fn read_into(&self, address: Address, buffer: &mut [u8]) -> MirrorResult<()> {
        if address.is_null() {
            return Err(MirrorError::read_failed(address, "null address"));
        }
        self.counters.reads.fetch_add(1, Ordering::Relaxed);
        match self.source.read_exact(address, buffer) {
            Ok(()) => {
                self.counters
                    .bytes_read
                    .fetch_add(buffer.len() as u64, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    pub fn read_bytes(&self, address: Address, length: usize) -> MirrorResult<Vec<u8>> {
        let mut buffer = vec![0u8; length];
        self.read_into(address, &mut buffer)?;
        Ok(buffer)
    }

    fn read_array<const N: usize>(&self, address: Address) -> MirrorResult<[u8; N]> {
        let mut buffer = [0u8; N];
        self.read_into(address, &mut buffer)?;
        Ok(buffer)
    }

    pub fn read_u8(&self, address: Address) -> MirrorResult<u8> {
        Ok(self.read_array::<1>(address)?[0])
    }

    pub fn read_i8(&self, address: Address) -> MirrorResult<i8> {
        Ok(self.read_u8(address)? as i8)
    }

    pub fn read_u16(&self, address: Address) -> MirrorResult<u16> {
        Ok(u16::from_le_bytes(self.read_array(address)?))
    }

    pub fn read_i16(&self, address: Address) -> MirrorResult<i16> {
        Ok(i16::from_le_bytes(self.read_array(address)?))
    }

    pub fn read_u32(&self, address: Address) -> MirrorResult<u32> {
        Ok(u32::from_le_bytes(self.read_array(address)?))
    }

    pub fn read_i32(&self, address: Address) -> MirrorResult<i32> {
        Ok(i32::from_le_bytes(self.read_array(address)?))
    }

    pub fn read_u64(&self, address: Address) -> MirrorResult<u64> {
        Ok(u64::from_le_bytes(self.read_array(address)?))
    }

    pub fn read_i64(&self, address: Address) -> MirrorResult<i64> {
        Ok(i64::from_le_bytes(self.read_array(address)?))
    }

    pub fn read_f32(&self, address: Address) -> MirrorResult<f32> {
        Ok(f32::from_le_bytes(self.read_array(address)?))
    }

    pub fn read_f64(&self, address: Address) -> MirrorResult<f64> {
        Ok(f64::from_le_bytes(self.read_array(address)?))
    }

    /// Reads an unsigned integer of `width` bytes (4 or 8)
    pub fn read_uint_sized(&self, address: Address, width: usize) -> MirrorResult<u64> {
        match width {
            4 => Ok(self.read_u32(address)? as u64),
            8 => self.read_u64(address),
            other => Err(MirrorError::UnsupportedRuntime(format!(
                "pointer width {} is not supported",
                other
            ))),
        }
    }

    /// Reads a pointer using the process's own architecture
    pub fn read_pointer(&self, address: Address) -> MirrorResult<Address> {
        self.read_pointer_sized(address, self.pointer_size())
    }

    /// Reads a pointer of an explicit width, for runtimes whose bitness
    /// differs from the hosting process
    pub fn read_pointer_sized(&self, address: Address, width: usize) -> MirrorResult<Address> {
        Ok(Address::from(self.read_uint_sized(address, width)?))
    }

    /// Reads a NUL-terminated byte string of at most `max_len` bytes
    pub fn read_c_string(&self, address: Address, max_len: usize) -> MirrorResult<String> {
        let mut bytes = Vec::new();
        let mut cursor = address;
        while bytes.len() < max_len {
            let want = C_STRING_CHUNK.min(max_len - bytes.len());
            let chunk = match self.read_bytes(cursor, want) {
                Ok(chunk) => chunk,
                // The string may end right before an unmapped page
                Err(MirrorError::PartialRead { actual, .. }) if actual > 0 => {
                    self.read_bytes(cursor, actual)?
                }
                Err(e) => return Err(e),
            };
            if let Some(end) = chunk.iter().position(|&b| b == 0) {
                bytes.extend_from_slice(&chunk[..end]);
                return Ok(String::from_utf8_lossy(&bytes).into_owned());
            }
            cursor = cursor + chunk.len();
            bytes.extend_from_slice(&chunk);
        }
        debug!(address = %address, max_len, "C string not terminated within limit");
        Err(MirrorError::StringTooLong {
            address: address.to_string(),
            length: bytes.len() as i64,
            max: max_len,
        })
    }
}

impl fmt::Debug for RemoteProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteProcess")
            .field("pid", &self.pid)
            .field("name", &self.name)
            .field("architecture", &self.architecture)
            .field("base_address", &self.base_address)
            .finish()
    }
}

impl fmt::Display for RemoteProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RemoteProcess(pid={}, name={})", self.pid, self.name)
    }
}

//! `ReadProcessMemory` backed memory source

use crate::core::types::{Address, MirrorResult, ModuleInfo, ProcessArchitecture, ProcessId};
use crate::memory::MemorySource;
use crate::windows::bindings::{kernel32, ntdll, psapi};
use crate::windows::types::Handle;
use tracing::debug;
use winapi::um::winnt::{PROCESS_QUERY_INFORMATION, PROCESS_VM_READ};

/// Read-only handle to a live Windows process
pub struct WindowsMemory {
    handle: Handle,
    pid: ProcessId,
    architecture: ProcessArchitecture,
}

impl WindowsMemory {
    /// Opens the process with query and read rights only
    pub fn open(pid: ProcessId) -> MirrorResult<Self> {
        let raw = kernel32::open_process(pid, PROCESS_QUERY_INFORMATION | PROCESS_VM_READ)?;
        let handle = Handle::new(raw);

        let wow64 = unsafe { ntdll::is_wow64_process(handle.raw()) }.unwrap_or(false);
        let architecture = if wow64 || cfg!(target_pointer_width = "32") {
            ProcessArchitecture::X86
        } else {
            ProcessArchitecture::X64
        };
        debug!(pid, wow64, %architecture, "Opened process handle");

        Ok(WindowsMemory {
            handle,
            pid,
            architecture,
        })
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    pub fn architecture(&self) -> ProcessArchitecture {
        self.architecture
    }
}

impl MemorySource for WindowsMemory {
    fn read_exact(&self, address: Address, buffer: &mut [u8]) -> MirrorResult<()> {
        if buffer.is_empty() {
            return Ok(());
        }
        unsafe { kernel32::read_process_memory(self.handle.raw(), address, buffer) }
    }

    fn modules(&self) -> MirrorResult<Vec<ModuleInfo>> {
        unsafe { psapi::list_modules(self.handle.raw()) }
    }

    fn is_alive(&self) -> bool {
        unsafe { kernel32::is_process_running(self.handle.raw()) }
    }
}

//! Process enumeration using the ToolHelp32 API

use crate::core::types::{MirrorError, MirrorResult, ProcessInfo};
use crate::windows::types::Handle;
use crate::windows::utils::wide_to_string;
use std::mem;
use winapi::shared::minwindef::FALSE;
use winapi::um::tlhelp32::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
    TH32CS_SNAPPROCESS,
};

/// Iterator over a ToolHelp32 process snapshot
pub struct ProcessEnumerator {
    snapshot: Handle,
    first_called: bool,
}

impl ProcessEnumerator {
    pub fn new() -> MirrorResult<Self> {
        let snapshot = Handle::new(unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) });
        if !snapshot.is_valid() {
            return Err(MirrorError::last_os_error());
        }
        Ok(ProcessEnumerator {
            snapshot,
            first_called: false,
        })
    }
}

impl Iterator for ProcessEnumerator {
    type Item = ProcessInfo;

    fn next(&mut self) -> Option<Self::Item> {
        let mut entry: PROCESSENTRY32W = unsafe { mem::zeroed() };
        entry.dwSize = mem::size_of::<PROCESSENTRY32W>() as u32;

        let success = unsafe {
            if self.first_called {
                Process32NextW(self.snapshot.raw(), &mut entry)
            } else {
                self.first_called = true;
                Process32FirstW(self.snapshot.raw(), &mut entry)
            }
        };
        if success == FALSE {
            return None;
        }

        Some(ProcessInfo::new(
            entry.th32ProcessID,
            wide_to_string(&entry.szExeFile),
        ))
    }
}

/// Enumerate all running processes
pub fn enumerate_processes() -> MirrorResult<Vec<ProcessInfo>> {
    Ok(ProcessEnumerator::new()?.collect())
}

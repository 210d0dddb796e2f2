//! NTDLL.dll bindings

use crate::core::types::{MirrorError, MirrorResult};
use std::mem;
use winapi::shared::minwindef::ULONG;
use winapi::shared::ntdef::{NTSTATUS, PVOID};
use winapi::um::winnt::HANDLE;

/// `PROCESSINFOCLASS::ProcessWow64Information`
const PROCESS_WOW64_INFORMATION: ULONG = 26;

#[link(name = "ntdll")]
extern "system" {
    fn NtQueryInformationProcess(
        process_handle: HANDLE,
        process_info_class: ULONG,
        process_info: PVOID,
        process_info_length: ULONG,
        return_length: *mut ULONG,
    ) -> NTSTATUS;
}

/// Check if NTSTATUS indicates success
pub fn nt_success(status: NTSTATUS) -> bool {
    status >= 0
}

/// Whether the process runs under WoW64, i.e. is a 32-bit process on 64-bit Windows
///
/// # Safety
/// The handle must be a valid process handle with `PROCESS_QUERY_INFORMATION`
pub unsafe fn is_wow64_process(handle: HANDLE) -> MirrorResult<bool> {
    let mut wow64_peb: usize = 0;
    let mut return_length = 0u32;

    let status = NtQueryInformationProcess(
        handle,
        PROCESS_WOW64_INFORMATION,
        &mut wow64_peb as *mut _ as PVOID,
        mem::size_of::<usize>() as ULONG,
        &mut return_length,
    );

    if nt_success(status) {
        Ok(wow64_peb != 0)
    } else {
        Err(MirrorError::attach_failed(format!(
            "failed to query WoW64 status: 0x{:X}",
            status
        )))
    }
}

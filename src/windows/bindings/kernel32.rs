//! Kernel32.dll bindings for read-only process access

use crate::core::types::{Address, MirrorError, MirrorResult};
use winapi::shared::minwindef::{DWORD, FALSE, LPVOID};
use winapi::um::handleapi::CloseHandle;
use winapi::um::memoryapi::ReadProcessMemory;
use winapi::um::minwinbase::STILL_ACTIVE;
use winapi::um::processthreadsapi::{GetExitCodeProcess, OpenProcess};
use winapi::um::winnt::HANDLE;

/// Safe wrapper for OpenProcess
pub fn open_process(pid: u32, desired_access: DWORD) -> MirrorResult<HANDLE> {
    let handle = unsafe { OpenProcess(desired_access, FALSE, pid) };
    if handle.is_null() {
        Err(MirrorError::attach_failed(format!(
            "OpenProcess failed for pid {}: {}",
            pid,
            MirrorError::last_os_error()
        )))
    } else {
        Ok(handle)
    }
}

/// Safe wrapper for CloseHandle
///
/// # Safety
/// The handle must be a valid Windows handle that is not used afterwards
pub unsafe fn close_handle(handle: HANDLE) -> MirrorResult<()> {
    if handle.is_null() {
        return Ok(());
    }
    if CloseHandle(handle) == FALSE {
        Err(MirrorError::last_os_error())
    } else {
        Ok(())
    }
}

/// Safe wrapper for ReadProcessMemory; a short read is an error
///
/// # Safety
/// The handle must be a valid process handle with `PROCESS_VM_READ`
pub unsafe fn read_process_memory(
    handle: HANDLE,
    address: Address,
    buffer: &mut [u8],
) -> MirrorResult<()> {
    let mut bytes_read = 0;
    let result = ReadProcessMemory(
        handle,
        address.as_usize() as LPVOID,
        buffer.as_mut_ptr() as LPVOID,
        buffer.len(),
        &mut bytes_read,
    );

    if result == FALSE && bytes_read == 0 {
        return Err(MirrorError::read_failed(
            address,
            format!("ReadProcessMemory failed: {}", MirrorError::last_os_error()),
        ));
    }
    if bytes_read != buffer.len() {
        return Err(MirrorError::partial_read(address, buffer.len(), bytes_read));
    }
    Ok(())
}

/// True while the process has not exited
///
/// # Safety
/// The handle must carry `PROCESS_QUERY_INFORMATION`
pub unsafe fn is_process_running(handle: HANDLE) -> bool {
    let mut code: DWORD = 0;
    GetExitCodeProcess(handle, &mut code) != FALSE && code == STILL_ACTIVE
}

//! PSAPI.dll bindings for module enumeration

use crate::core::types::{Address, MirrorError, MirrorResult, ModuleInfo};
use crate::windows::utils::string_conv::wide_to_string;
use std::path::PathBuf;
use winapi::shared::minwindef::{DWORD, FALSE, HMODULE, MAX_PATH};
use winapi::um::psapi::{
    EnumProcessModulesEx, GetModuleBaseNameW, GetModuleFileNameExW, GetModuleInformation,
    LIST_MODULES_ALL, MODULEINFO,
};
use winapi::um::winnt::HANDLE;

const MAX_MODULES: usize = 1024;

/// Safe wrapper for EnumProcessModulesEx, listing both 32 and 64-bit modules
///
/// # Safety
/// The handle must be a valid process handle
pub unsafe fn enum_process_modules(handle: HANDLE) -> MirrorResult<Vec<HMODULE>> {
    let mut modules = vec![std::ptr::null_mut(); MAX_MODULES];
    let mut bytes_needed = 0u32;

    let result = EnumProcessModulesEx(
        handle,
        modules.as_mut_ptr(),
        (modules.len() * std::mem::size_of::<HMODULE>()) as DWORD,
        &mut bytes_needed,
        LIST_MODULES_ALL,
    );
    if result == FALSE {
        return Err(MirrorError::last_os_error());
    }

    let count = bytes_needed as usize / std::mem::size_of::<HMODULE>();
    modules.truncate(count.min(MAX_MODULES));
    Ok(modules)
}

/// Safe wrapper for GetModuleInformation
///
/// # Safety
/// The handle must be a valid process handle and module must belong to it
pub unsafe fn get_module_information(handle: HANDLE, module: HMODULE) -> MirrorResult<MODULEINFO> {
    let mut info = MODULEINFO {
        lpBaseOfDll: std::ptr::null_mut(),
        SizeOfImage: 0,
        EntryPoint: std::ptr::null_mut(),
    };

    let result = GetModuleInformation(
        handle,
        module,
        &mut info,
        std::mem::size_of::<MODULEINFO>() as DWORD,
    );
    if result == FALSE {
        return Err(MirrorError::last_os_error());
    }
    Ok(info)
}

/// Safe wrapper for GetModuleBaseNameW
///
/// # Safety
/// The handle must be a valid process handle and module must belong to it
pub unsafe fn get_module_base_name(handle: HANDLE, module: HMODULE) -> MirrorResult<String> {
    let mut buffer = vec![0u16; MAX_PATH];
    let length = GetModuleBaseNameW(handle, module, buffer.as_mut_ptr(), MAX_PATH as DWORD);
    if length == 0 {
        return Err(MirrorError::last_os_error());
    }
    Ok(wide_to_string(&buffer[..length as usize]))
}

/// Safe wrapper for GetModuleFileNameExW
///
/// # Safety
/// The handle must be a valid process handle and module must belong to it
pub unsafe fn get_module_file_name(handle: HANDLE, module: HMODULE) -> MirrorResult<PathBuf> {
    let mut buffer = vec![0u16; MAX_PATH];
    let length = GetModuleFileNameExW(handle, module, buffer.as_mut_ptr(), MAX_PATH as DWORD);
    if length == 0 {
        return Err(MirrorError::last_os_error());
    }
    Ok(PathBuf::from(wide_to_string(&buffer[..length as usize])))
}

/// Lists every module loaded in the process
///
/// # Safety
/// The handle must carry `PROCESS_QUERY_INFORMATION | PROCESS_VM_READ`
pub unsafe fn list_modules(handle: HANDLE) -> MirrorResult<Vec<ModuleInfo>> {
    let mut modules = Vec::new();
    for module in enum_process_modules(handle)? {
        let Ok(info) = get_module_information(handle, module) else {
            continue;
        };
        let name = get_module_base_name(handle, module).unwrap_or_default();
        let mut entry = ModuleInfo::new(
            name,
            Address::new(info.lpBaseOfDll as usize),
            info.SizeOfImage as usize,
        );
        if let Ok(path) = get_module_file_name(handle, module) {
            entry.path = path;
        }
        modules.push(entry);
    }
    Ok(modules)
}

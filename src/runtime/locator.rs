//! Locating the Mono runtime and the game image inside the target

use super::layout::{RuntimeLayout, RuntimeVersion};
use super::pe;
use crate::config::{LocatorConfig, TargetConfig};
use crate::core::types::{Address, MirrorError, MirrorResult, ModuleInfo};
use crate::process::RemoteProcess;
use std::collections::HashSet;
use tracing::{debug, info, trace};

const RUNTIME_MODULES: [&str; 2] = ["mono-2.0-bdwgc.dll", "mono.dll"];
const UNITY_PLAYER: &str = "UnityPlayer.dll";
const ENUMERATION_EXPORT: &str = "mono_assembly_foreach";
const CODE_SCAN_WINDOW: usize = 0x100;
const ASSEMBLY_NAME_MAX: usize = 256;
const MAX_ASSEMBLIES: usize = 4096;
const VERSION_SCAN_CHUNK: usize = 0x10000;
const VERSION_SIGNATURE_LEN: usize = 6;

/// Everything derived once per attach about the target's runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeImage {
    pub version: RuntimeVersion,
    pub layout: RuntimeLayout,
    pub module: ModuleInfo,
    /// Head of the runtime's loaded-assembly `GList`
    pub assemblies: Address,
    pub assembly: Address,
    pub assembly_name: String,
    /// `MonoImage` of the game assembly
    pub image: Address,
}

/// Finds the runtime and the configured assembly.
///
/// `NotReady` means the target is still starting up and the call may be
/// repeated.
pub fn locate(process: &RemoteProcess, target: &TargetConfig) -> MirrorResult<RuntimeImage> {
    let module = find_runtime_module(process)?;
    let headers = pe::read_headers(process, module.base_address)?;
    let pointer_size = headers.machine.pointer_size().ok_or_else(|| {
        MirrorError::UnsupportedRuntime(format!(
            "{} built for unsupported machine {:?}",
            module.name, headers.machine
        ))
    })?;

    let version = match RuntimeVersion::from_setting(&target.runtime_version) {
        Some(version) => version,
        None => detect_version(process, &module)?,
    };
    let layout = RuntimeLayout::for_version(version, pointer_size)?;
    info!(module = %module.name, %version, pointer_size, "Runtime module found");

    let function = pe::find_export(process, &headers, ENUMERATION_EXPORT)?.ok_or_else(|| {
        MirrorError::UnsupportedRuntime(format!(
            "{} does not export {}",
            module.name, ENUMERATION_EXPORT
        ))
    })?;
    let global = assembly_list_global(process, &layout, function)?;
    let assemblies = layout.read_ptr(process, global)?;
    if assemblies.is_null() {
        return Err(MirrorError::not_ready("assembly list is empty"));
    }

    let (assembly, assembly_name) = walk_assemblies(process, &layout, assemblies)?
        .into_iter()
        .find(|(_, name)| name == &target.assembly_name)
        .ok_or_else(|| {
            MirrorError::not_ready(format!("assembly {} not loaded", target.assembly_name))
        })?;

    let image = layout.read_ptr(process, assembly + layout.assembly_image)?;
    if image.is_null() {
        return Err(MirrorError::not_ready(format!(
            "assembly {} has no image yet",
            assembly_name
        )));
    }
    info!(assembly = %assembly_name, image = %image, "Assembly matched");

    Ok(RuntimeImage {
        version,
        layout,
        module,
        assemblies,
        assembly,
        assembly_name,
        image,
    })
}

/// Retries [`locate`] while the runtime reports `NotReady`
pub fn locate_with_retry(
    process: &RemoteProcess,
    target: &TargetConfig,
    locator: &LocatorConfig,
) -> MirrorResult<RuntimeImage> {
    let mut attempt = 1;
    loop {
        match locate(process, target) {
            Ok(image) => return Ok(image),
            Err(e) if e.is_retryable() && attempt < locator.attempts => {
                debug!(attempt, error = %e, "Runtime not ready, retrying");
                std::thread::sleep(locator.retry_delay());
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Names of every assembly currently loaded by the runtime
pub fn assembly_names(process: &RemoteProcess, image: &RuntimeImage) -> MirrorResult<Vec<String>> {
    Ok(walk_assemblies(process, &image.layout, image.assemblies)?
        .into_iter()
        .map(|(_, name)| name)
        .collect())
}

fn find_runtime_module(process: &RemoteProcess) -> MirrorResult<ModuleInfo> {
    let modules = process.modules()?;
    RUNTIME_MODULES
        .iter()
        .find_map(|name| modules.iter().find(|m| m.is_named(name)))
        .cloned()
        .ok_or_else(|| MirrorError::not_ready("runtime module not loaded"))
}

/// Decodes the instruction in `mono_assembly_foreach` that loads the list global
fn assembly_list_global(
    process: &RemoteProcess,
    layout: &RuntimeLayout,
    function: Address,
) -> MirrorResult<Address> {
    let code = match process.read_bytes(function, CODE_SCAN_WINDOW) {
        Ok(code) => code,
        Err(MirrorError::PartialRead { actual, .. }) if actual > 0 => {
            process.read_bytes(function, actual)?
        }
        Err(e) => return Err(e),
    };

    let global = if layout.pointer_size == 8 {
        // mov rcx, [rip + rel32]
        code.windows(7)
            .position(|w| w[..3] == [0x48, 0x8B, 0x0D])
            .map(|i| {
                let rel = i32::from_le_bytes([code[i + 3], code[i + 4], code[i + 5], code[i + 6]]);
                (function + i + 7).offset(rel as isize)
            })
    } else {
        // push [abs32] or mov ecx, [abs32]
        code.windows(6)
            .position(|w| w[..2] == [0xFF, 0x35] || w[..2] == [0x8B, 0x0D])
            .map(|i| {
                Address::from(u32::from_le_bytes([
                    code[i + 2],
                    code[i + 3],
                    code[i + 4],
                    code[i + 5],
                ]))
            })
    };

    let global = global.ok_or_else(|| {
        MirrorError::UnsupportedRuntime(format!(
            "no assembly list reference in {} at {}",
            ENUMERATION_EXPORT, function
        ))
    })?;
    trace!(function = %function, global = %global, "Resolved assembly list global");
    Ok(global)
}

/// Walks the `GList` of `MonoAssembly*`, yielding each assembly's name
fn walk_assemblies(
    process: &RemoteProcess,
    layout: &RuntimeLayout,
    head: Address,
) -> MirrorResult<Vec<(Address, String)>> {
    let mut seen = HashSet::new();
    let mut assemblies = Vec::new();
    let mut node = head;

    while !node.is_null() && seen.insert(node) && assemblies.len() < MAX_ASSEMBLIES {
        let assembly = layout.read_ptr(process, node)?;
        node = layout.read_ptr(process, node + layout.pointer_size)?;
        if assembly.is_null() {
            continue;
        }
        let name = layout
            .read_ptr(process, assembly + layout.assembly_aname)
            .and_then(|name| process.read_c_string(name, ASSEMBLY_NAME_MAX));
        match name {
            Ok(name) => assemblies.push((assembly, name)),
            Err(e) => trace!(assembly = %assembly, error = %e, "Skipping unreadable assembly"),
        }
    }
    Ok(assemblies)
}

/// Picks the runtime flavour from the module name and the Unity version
pub fn detect_version(process: &RemoteProcess, module: &ModuleInfo) -> MirrorResult<RuntimeVersion> {
    if module.is_named("mono.dll") {
        return Ok(RuntimeVersion::V1);
    }
    let Some(player) = process.find_module(UNITY_PLAYER)? else {
        return Ok(RuntimeVersion::V2);
    };

    let version = scan_unity_version(process, &player);
    debug!(?version, "Detected Unity version");
    Ok(match version {
        Some((year, minor)) if year > 2021 || (year == 2021 && minor >= 2) => RuntimeVersion::V3,
        _ => RuntimeVersion::V2,
    })
}

/// Finds the first `\0202x.` version string in the player module
fn scan_unity_version(process: &RemoteProcess, player: &ModuleInfo) -> Option<(u32, u32)> {
    let end = player.end_address();
    let mut cursor = player.base_address;
    while cursor < end {
        let len = VERSION_SCAN_CHUNK.min(end.as_usize() - cursor.as_usize());
        if let Ok(chunk) = process.read_bytes(cursor, len) {
            let found = chunk
                .windows(VERSION_SIGNATURE_LEN)
                .enumerate()
                .filter(|(_, w)| w[0] == 0 && &w[1..4] == b"202" && w[5] == b'.')
                .find_map(|(i, _)| parse_unity_version(&chunk[i + 1..(i + 16).min(chunk.len())]));
            if found.is_some() {
                return found;
            }
        }
        // Overlap so a signature straddling two chunks is still seen
        let step = len.saturating_sub(VERSION_SIGNATURE_LEN).max(1);
        cursor = cursor + step;
    }
    None
}

/// Parses `YYYY.M` from the start of `bytes`
pub fn parse_unity_version(bytes: &[u8]) -> Option<(u32, u32)> {
    let dot = bytes.iter().position(|&b| b == b'.')?;
    let digits = |slice: &[u8]| -> Option<u32> {
        let text: String = slice
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .map(|&b| b as char)
            .collect();
        text.parse().ok()
    };
    Some((digits(&bytes[..dot])?, digits(&bytes[dot + 1..])?))
}

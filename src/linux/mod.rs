//! Linux backend using procfs
//!
//! Reads go through `/proc/<pid>/mem`, modules come from `/proc/<pid>/maps`
//! and process names from `/proc/<pid>/cmdline` or `/proc/<pid>/comm`. This is
//! the path for a game client running under Wine.

use crate::core::types::{
    Address, MirrorError, MirrorResult, ModuleInfo, ProcessArchitecture, ProcessId, ProcessInfo,
};
use crate::memory::MemorySource;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Memory source backed by `/proc/<pid>/mem`
pub struct ProcMemory {
    pid: ProcessId,
    mem: File,
    architecture: ProcessArchitecture,
}

impl ProcMemory {
    /// Opens the target's memory file; needs ptrace access to the process
    pub fn open(pid: ProcessId) -> MirrorResult<Self> {
        let mem = File::open(proc_path(pid, "mem"))?;
        let architecture =
            elf_architecture(&proc_path(pid, "exe")).unwrap_or(ProcessArchitecture::Unknown);
        Ok(ProcMemory {
            pid,
            mem,
            architecture,
        })
    }

    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Bitness of the hosting executable
    pub fn architecture(&self) -> ProcessArchitecture {
        self.architecture
    }
}

impl MemorySource for ProcMemory {
    fn read_exact(&self, address: Address, buffer: &mut [u8]) -> MirrorResult<()> {
        let mut done = 0;
        while done < buffer.len() {
            match self
                .mem
                .read_at(&mut buffer[done..], address.as_u64() + done as u64)
            {
                Ok(0) => break,
                Ok(n) => done += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if done == 0 => {
                    return Err(MirrorError::read_failed(address, e.to_string()));
                }
                Err(_) => break,
            }
        }
        if done < buffer.len() {
            return Err(MirrorError::partial_read(address, buffer.len(), done));
        }
        Ok(())
    }

    fn modules(&self) -> MirrorResult<Vec<ModuleInfo>> {
        let maps = fs::read_to_string(proc_path(self.pid, "maps"))?;
        Ok(modules_from_maps(&maps))
    }

    fn is_alive(&self) -> bool {
        match fs::read_to_string(proc_path(self.pid, "stat")) {
            // Zombies keep their /proc entry until reaped
            Ok(stat) => !matches!(process_state(&stat), Some('Z') | Some('X')),
            Err(_) => false,
        }
    }
}

/// Enumerate processes visible in `/proc`
pub fn enumerate_processes() -> MirrorResult<Vec<ProcessInfo>> {
    let mut processes = Vec::new();
    for entry in fs::read_dir("/proc")? {
        let Ok(entry) = entry else { continue };
        let Some(pid) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<ProcessId>().ok())
        else {
            continue;
        };
        if let Some(name) = process_name(pid) {
            let mut info = ProcessInfo::new(pid, name);
            info.path = fs::read_link(proc_path(pid, "exe")).ok();
            processes.push(info);
        }
    }
    Ok(processes)
}

fn proc_path(pid: ProcessId, leaf: &str) -> PathBuf {
    PathBuf::from(format!("/proc/{}/{}", pid, leaf))
}

/// Windows-style image name from the command line, else the kernel's comm
fn process_name(pid: ProcessId) -> Option<String> {
    let from_cmdline = fs::read(proc_path(pid, "cmdline")).ok().and_then(|raw| {
        let first = raw.split(|&b| b == 0).next()?;
        let first = String::from_utf8_lossy(first);
        let base = first.rsplit(&['/', '\\'][..]).next()?.trim().to_string();
        (!base.is_empty()).then_some(base)
    });
    from_cmdline.or_else(|| {
        fs::read_to_string(proc_path(pid, "comm"))
            .ok()
            .map(|comm| comm.trim().to_string())
            .filter(|comm| !comm.is_empty())
    })
}

fn elf_architecture(path: &Path) -> Option<ProcessArchitecture> {
    let mut header = [0u8; 5];
    File::open(path).ok()?.read_exact(&mut header).ok()?;
    if &header[..4] != b"\x7fELF" {
        return None;
    }
    match header[4] {
        1 => Some(ProcessArchitecture::X86),
        2 => Some(ProcessArchitecture::X64),
        _ => None,
    }
}

/// State letter following the parenthesised command in `/proc/<pid>/stat`
fn process_state(stat: &str) -> Option<char> {
    let after = stat.rsplit_once(')')?.1;
    after.trim_start().chars().next()
}

/// Parses one maps line into (start, end, path); anonymous mappings yield None
fn parse_maps_line(line: &str) -> Option<(usize, usize, &str)> {
    let mut parts = line.splitn(6, char::is_whitespace);
    let range = parts.next()?;
    let (start, end) = range.split_once('-')?;
    let start = usize::from_str_radix(start, 16).ok()?;
    let end = usize::from_str_radix(end, 16).ok()?;
    // perms, offset, dev, inode
    for _ in 0..4 {
        parts.next()?;
    }
    let path = parts.next()?.trim();
    if path.is_empty() || path.starts_with('[') {
        return None;
    }
    Some((start, end, path))
}

fn modules_from_maps(maps: &str) -> Vec<ModuleInfo> {
    let mut spans: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for (start, end, path) in maps.lines().filter_map(parse_maps_line) {
        let span = spans.entry(path).or_insert((start, end));
        span.0 = span.0.min(start);
        span.1 = span.1.max(end);
    }

    let mut modules: Vec<ModuleInfo> = spans
        .into_iter()
        .map(|(path, (start, end))| {
            let name = path.rsplit(&['/', '\\'][..]).next().unwrap_or(path).to_string();
            let mut module = ModuleInfo::new(name, Address::new(start), end - start);
            module.path = PathBuf::from(path);
            module
        })
        .collect();
    modules.sort_by_key(|m| m.base_address);
    trace!(count = modules.len(), "Parsed modules from maps");
    modules
}

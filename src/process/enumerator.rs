//! Process enumeration across platform backends

use crate::core::types::{MirrorResult, ProcessInfo};
use tracing::debug;

/// Enumerate all running processes visible to the current user
pub fn enumerate_processes() -> MirrorResult<Vec<ProcessInfo>> {
    #[cfg(windows)]
    {
        crate::windows::enumerate_processes()
    }

    #[cfg(target_os = "linux")]
    {
        crate::linux::enumerate_processes()
    }

    #[cfg(not(any(windows, target_os = "linux")))]
    {
        Ok(Vec::new())
    }
}

/// Find processes by name (case-insensitive, `.exe` optional)
pub fn find_processes_by_name(name: &str) -> MirrorResult<Vec<ProcessInfo>> {
    let processes = enumerate_processes()?;
    Ok(filter_by_name(processes, name))
}

/// Find a single process by name
pub fn find_process_by_name(name: &str) -> MirrorResult<Option<ProcessInfo>> {
    let found = find_processes_by_name(name)?.into_iter().next();
    match &found {
        Some(info) => debug!(pid = info.pid, name = %info.name, "Found target process"),
        None => debug!(name, "Target process not found"),
    }
    Ok(found)
}

fn filter_by_name(processes: Vec<ProcessInfo>, name: &str) -> Vec<ProcessInfo> {
    processes
        .into_iter()
        .filter(|p| p.name_matches(name))
        .collect()
}

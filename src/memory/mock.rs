//! In-memory address space for testing
//!
//! Regions are mapped explicitly; reads must fall entirely inside one region.
//! Clones share the same address space, so a test can keep a handle after
//! moving another into a [`RemoteProcess`](crate::process::RemoteProcess).

use super::MemorySource;
use crate::core::types::{Address, MirrorError, MirrorResult, ModuleInfo};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One-shot write applied right after a read touches `trigger`
#[derive(Debug, Clone)]
struct ReadPatch {
    trigger: Address,
    address: Address,
    bytes: Vec<u8>,
}

#[derive(Debug)]
struct MockState {
    regions: BTreeMap<usize, Vec<u8>>,
    modules: Vec<ModuleInfo>,
    patches: Vec<ReadPatch>,
    alive: bool,
    reads: u64,
}

impl MockState {
    fn region_mut(&mut self, address: Address, len: usize) -> MirrorResult<&mut [u8]> {
        let (base, data) = self
            .regions
            .range_mut(..=address.as_usize())
            .next_back()
            .ok_or_else(|| MirrorError::InvalidAddress(address.to_string()))?;
        let offset = address.as_usize() - *base;
        if offset + len > data.len() {
            return Err(MirrorError::InvalidAddress(format!(
                "{} (+0x{:X}) outside mapped region",
                address, len
            )));
        }
        Ok(&mut data[offset..offset + len])
    }

    fn read(&self, address: Address, buffer: &mut [u8]) -> MirrorResult<()> {
        let (base, data) = self
            .regions
            .range(..=address.as_usize())
            .next_back()
            .ok_or_else(|| MirrorError::read_failed(address, "unmapped address"))?;
        let offset = address.as_usize() - *base;
        if offset >= data.len() {
            return Err(MirrorError::read_failed(address, "unmapped address"));
        }
        let available = data.len() - offset;
        if available < buffer.len() {
            return Err(MirrorError::partial_read(address, buffer.len(), available));
        }
        buffer.copy_from_slice(&data[offset..offset + buffer.len()]);
        Ok(())
    }
}

/// Mock memory source shared between the test and the code under test
#[derive(Debug, Clone)]
pub struct MockMemory {
    state: Arc<Mutex<MockState>>,
}

impl MockMemory {
    /// Creates an empty, live address space
    pub fn new() -> Self {
        MockMemory {
            state: Arc::new(Mutex::new(MockState {
                regions: BTreeMap::new(),
                modules: Vec::new(),
                patches: Vec::new(),
                alive: true,
                reads: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Maps a new region at `base`. Overlapping regions are not merged.
    pub fn map(&self, base: Address, bytes: Vec<u8>) {
        self.state().regions.insert(base.as_usize(), bytes);
    }

    /// Overwrites bytes inside an already mapped region
    pub fn write(&self, address: Address, bytes: &[u8]) -> MirrorResult<()> {
        let mut state = self.state();
        state.region_mut(address, bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Registers a module reported by [`MemorySource::modules`]
    pub fn add_module(&self, module: ModuleInfo) {
        self.state().modules.push(module);
    }

    /// Schedules `bytes` to be written at `address` once a read covers `trigger`.
    ///
    /// The triggering read still observes the old contents.
    pub fn patch_after_read(&self, trigger: Address, address: Address, bytes: Vec<u8>) {
        self.state().patches.push(ReadPatch {
            trigger,
            address,
            bytes,
        });
    }

    /// Marks the process as exited; every later read fails
    pub fn terminate(&self) {
        self.state().alive = false;
    }

    /// Number of successful reads served so far
    pub fn read_count(&self) -> u64 {
        self.state().reads
    }
}

impl Default for MockMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource for MockMemory {
    fn read_exact(&self, address: Address, buffer: &mut [u8]) -> MirrorResult<()> {
        let mut state = self.state();
        if !state.alive {
            return Err(MirrorError::read_failed(address, "process has exited"));
        }
        if buffer.is_empty() {
            return Ok(());
        }

        state.read(address, buffer)?;
        state.reads += 1;

        let end = address.as_usize() + buffer.len();
        let (fired, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut state.patches)
            .into_iter()
            .partition(|p| p.trigger.as_usize() >= address.as_usize() && p.trigger.as_usize() < end);
        state.patches = pending;
        for patch in fired {
            if let Ok(target) = state.region_mut(patch.address, patch.bytes.len()) {
                target.copy_from_slice(&patch.bytes);
            }
        }
        Ok(())
    }

    fn modules(&self) -> MirrorResult<Vec<ModuleInfo>> {
        let state = self.state();
        if !state.alive {
            return Err(MirrorError::read_failed(Address::null(), "process has exited"));
        }
        Ok(state.modules.clone())
    }

    fn is_alive(&self) -> bool {
        self.state().alive
    }
}

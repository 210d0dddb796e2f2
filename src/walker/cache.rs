//! Per-query memo of decoded objects

use crate::core::types::{Address, RemoteValue};
use std::collections::HashMap;
use tracing::trace;

/// Hit and miss counters for one query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Objects decoded during a single query, keyed by object address.
///
/// Owned by one [`Walker`](super::Walker) and dropped with it.
#[derive(Debug, Default)]
pub struct SnapshotCache {
    values: HashMap<Address, RemoteValue>,
    hits: u64,
    misses: u64,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, address: Address) -> Option<RemoteValue> {
        match self.values.get(&address) {
            Some(value) => {
                self.hits += 1;
                trace!(address = %address, "Snapshot cache hit");
                Some(value.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, address: Address, value: RemoteValue) {
        self.values.insert(address, value);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.values.len(),
        }
    }
}

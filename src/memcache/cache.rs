//! MemCache implementation
//!
//! HashMap-based key → offset index with RwLock for concurrency.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::storage::Offset;

/// In-memory index from key to slot offset
///
/// Holds every live key. There is no eviction: the index is only bounded by
/// how many slots fit in the data file.
#[derive(Debug, Default)]
pub struct MemCache {
    entries: RwLock<HashMap<String, Offset>>,
}

impl MemCache {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the index with offsets recovered from a file scan
    pub fn with_entries(entries: HashMap<String, Offset>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Offset of `key`, or `Offset::ROOT` when the key is not indexed
    pub fn get(&self, key: &str) -> Offset {
        self.entries
            .read()
            .get(key)
            .copied()
            .unwrap_or(Offset::ROOT)
    }

    /// Insert or replace the offset for `key`
    pub fn write(&self, key: impl Into<String>, pos: Offset) {
        self.entries.write().insert(key.into(), pos);
    }

    /// Remove `key`, returning the offset it had
    pub fn delete(&self, key: &str) -> Option<Offset> {
        self.entries.write().remove(key)
    }

    /// Number of indexed keys
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of all indexed keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Snapshot of all (key, offset) pairs, sorted by offset
    pub fn entries(&self) -> Vec<(String, Offset)> {
        let mut entries: Vec<(String, Offset)> = self
            .entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        entries.sort_by_key(|(_, pos)| *pos);
        entries
    }
}

//! In-process storage backed by a sorted map.
//!
//! Every operation takes the lock once, so `put_if_absent` and `take` are
//! single atomic steps. Nothing survives the process.

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::{children_of, Storage, StorageEntry};
use crate::error::{Result, VaultError};

/// Thread-safe in-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys across all prefixes.
    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> VaultError {
    VaultError::StorageError("memory storage lock poisoned".into())
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<StorageEntry>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).map(|value| StorageEntry {
            key: key.to_string(),
            value: value.clone(),
        }))
    }

    fn put(&self, entry: StorageEntry) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(entry.key, entry.value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(children_of(prefix, entries.keys().map(String::as_str)))
    }

    fn put_if_absent(&self, entry: StorageEntry) -> Result<bool> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        if entries.contains_key(&entry.key) {
            return Ok(false);
        }
        entries.insert(entry.key, entry.value);
        Ok(true)
    }

    fn take(&self, key: &str) -> Result<Option<StorageEntry>> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        Ok(entries.remove(key).map(|value| StorageEntry {
            key: key.to_string(),
            value,
        }))
    }
}

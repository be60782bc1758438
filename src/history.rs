//! Log of completed labeling passes, kept in a capacity-bounded key/value store.
//!
//! Browser storage refuses writes once its quota is used up. The log copes by
//! dropping its oldest entries until the write fits, and clears itself when
//! not even a single entry can be stored.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::LabelingMode;
use crate::session::SaveReport;

/// Errors from key/value storage.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The write would exceed the storage quota
    #[error("Storage capacity exceeded: {needed} bytes needed, {available} available")]
    CapacityExceeded { needed: usize, available: usize },

    /// Stored data could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// String key/value storage with a byte quota, like browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value, failing with [`CacheError::CapacityExceeded`] when the quota is hit.
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

    fn remove(&self, key: &str);
}

/// In-memory [`KeyValueStore`] counting key and value bytes against a quota.
#[derive(Debug)]
pub struct MemoryKeyValueStore {
    capacity_bytes: usize,
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            capacity_bytes,
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Bytes currently in use.
    pub fn used_bytes(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let existing = self
            .entries
            .borrow()
            .get(key)
            .map(|v| key.len() + v.len())
            .unwrap_or(0);
        let available = self.capacity_bytes - (self.used_bytes() - existing);
        let needed = key.len() + value.len();
        if needed > available {
            return Err(CacheError::CapacityExceeded { needed, available });
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

/// One completed labeling pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub image_id: String,
    pub mode: LabelingMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion_id: Option<u64>,
    pub annotation_count: usize,
}

impl From<&SaveReport> for HistoryEntry {
    fn from(report: &SaveReport) -> Self {
        Self {
            image_id: report.image_id.clone(),
            mode: report.mode,
            suggestion_id: report.suggestion_id,
            annotation_count: report.committed,
        }
    }
}

/// Newest-first history stored as one JSON array under a single key.
pub struct HistoryLog<'a, S: KeyValueStore + ?Sized> {
    store: &'a S,
    key: String,
}

impl<'a, S: KeyValueStore + ?Sized> HistoryLog<'a, S> {
    pub fn new(store: &'a S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// All entries, newest first. Unreadable data counts as empty.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        let Some(json) = self.store.get(&self.key) else {
            return Vec::new();
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("Discarding unreadable history under '{}': {}", self.key, e);
            Vec::new()
        })
    }

    /// Prepend an entry, evicting the oldest ones if the store is full.
    ///
    /// Returns how many old entries were dropped. If even the new entry alone
    /// does not fit, the history is cleared and the error returned.
    pub fn record(&self, entry: HistoryEntry) -> Result<usize, CacheError> {
        let mut entries = self.entries();
        entries.insert(0, entry);

        let mut dropped = 0;
        loop {
            let json = serde_json::to_string(&entries)?;
            match self.store.set(&self.key, &json) {
                Ok(()) => {
                    if dropped > 0 {
                        log::debug!("History full, dropped {} oldest entries", dropped);
                    }
                    return Ok(dropped);
                }
                Err(CacheError::CapacityExceeded { .. }) if entries.len() > 1 => {
                    entries.pop();
                    dropped += 1;
                }
                Err(err) => {
                    log::warn!("History cannot be stored, clearing it: {}", err);
                    self.store.remove(&self.key);
                    return Err(err);
                }
            }
        }
    }

    pub fn clear(&self) {
        self.store.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> HistoryEntry {
        HistoryEntry {
            image_id: format!("img{n}"),
            mode: LabelingMode::Manual,
            suggestion_id: None,
            annotation_count: n,
        }
    }

    fn entry_size(n: usize) -> usize {
        serde_json::to_string(&entry(n)).expect("serialize").len()
    }

    #[test]
    fn test_store_quota() {
        let store = MemoryKeyValueStore::new(10);
        assert!(store.set("a", "12345").is_ok());
        assert!(matches!(
            store.set("b", "12345"),
            Err(CacheError::CapacityExceeded { .. })
        ));
        // Overwriting reuses the existing entry's bytes
        assert!(store.set("a", "123456789").is_ok());
        assert_eq!(store.used_bytes(), 10);
    }

    #[test]
    fn test_record_newest_first() {
        let store = MemoryKeyValueStore::new(4096);
        let log = HistoryLog::new(&store, "history");
        log.record(entry(1)).expect("record");
        log.record(entry(2)).expect("record");

        let entries = log.entries();
        assert_eq!(entries, vec![entry(2), entry(1)]);
    }

    #[test]
    fn test_record_drops_oldest_when_full() {
        // Room for the key, brackets, and roughly three entries
        let capacity = "history".len() + 2 + 3 * (entry_size(1) + 1);
        let store = MemoryKeyValueStore::new(capacity);
        let log = HistoryLog::new(&store, "history");

        for n in 1..=3 {
            assert_eq!(log.record(entry(n)).expect("record"), 0);
        }
        assert_eq!(log.record(entry(4)).expect("record"), 1);

        let ids: Vec<_> = log.entries().into_iter().map(|e| e.image_id).collect();
        assert_eq!(ids, vec!["img4", "img3", "img2"]);
    }

    #[test]
    fn test_record_clears_when_nothing_fits() {
        let tiny = MemoryKeyValueStore::new(8);
        let log = HistoryLog::new(&tiny, "history");

        assert!(log.record(entry(1)).is_err());
        assert!(tiny.get("history").is_none());
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_unreadable_history_is_empty() {
        let store = MemoryKeyValueStore::new(4096);
        store.set("history", "garbage").expect("seed");
        let log = HistoryLog::new(&store, "history");
        assert!(log.entries().is_empty());

        log.record(entry(1)).expect("record");
        assert_eq!(log.entries().len(), 1);
    }

    #[test]
    fn test_entry_from_report() {
        let report = SaveReport {
            committed: 3,
            image_id: "queue-7".into(),
            mode: LabelingMode::ActiveLearning,
            suggestion_id: Some(7),
            registry_error: None,
        };
        let entry = HistoryEntry::from(&report);
        assert_eq!(entry.annotation_count, 3);
        assert_eq!(entry.suggestion_id, Some(7));
    }
}

//! In-run deduplication store
//!
//! Keyed by stable id, remembering the last accepted payload and its
//! content hash. This is the sole dedup mechanism: an incoming record whose
//! hash matches the stored one is a no-op re-fetch and must not be counted
//! as inserted or mutate stored state.
//!
//! Process-local by design; a production deployment backs the same
//! `{stable_id → content_hash}` index durably so dedup survives restarts.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// Last accepted state for one stable id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    pub payload: Value,
    pub content_hash: String,
}

/// Concurrent map of accepted records.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: RwLock<HashMap<String, StoredEntry>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `payload`/`content_hash` under `stable_id` unless an entry with
    /// an identical hash is already present.
    ///
    /// Returns `true` when state changed (new id, or content changed) and
    /// `false` for a no-op re-fetch. The decision is made under the write
    /// lock, so it is linearizable against the latest committed state.
    pub fn upsert(&self, stable_id: &str, payload: Value, content_hash: &str) -> bool {
        let mut records = self.records.write().expect("record store lock poisoned");
        if let Some(existing) = records.get(stable_id) {
            if existing.content_hash == content_hash {
                return false;
            }
        }
        records.insert(
            stable_id.to_string(),
            StoredEntry {
                payload,
                content_hash: content_hash.to_string(),
            },
        );
        true
    }

    pub fn get(&self, stable_id: &str) -> Option<StoredEntry> {
        self.records
            .read()
            .expect("record store lock poisoned")
            .get(stable_id)
            .cloned()
    }

    /// Sorted stable ids currently held, for inspection and tests.
    pub fn snapshot_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .records
            .read()
            .expect("record store lock poisoned")
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.records.read().expect("record store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upsert_new_id_is_insert() {
        let store = RecordStore::new();
        assert!(store.upsert("meeting:1", json!({"title": "a"}), "h1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_upsert_identical_hash_is_noop() {
        let store = RecordStore::new();
        assert!(store.upsert("meeting:1", json!({"title": "a"}), "h1"));
        assert!(!store.upsert("meeting:1", json!({"title": "a"}), "h1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_upsert_changed_hash_replaces_entry() {
        // hashes h1 then h2 then h2 again: insert, insert, duplicate
        let store = RecordStore::new();
        assert!(store.upsert("meeting:1", json!({"v": 1}), "h1"));
        assert!(store.upsert("meeting:1", json!({"v": 2}), "h2"));
        assert!(!store.upsert("meeting:1", json!({"v": 2}), "h2"));

        let entry = store.get("meeting:1").unwrap();
        assert_eq!(entry.content_hash, "h2");
        assert_eq!(entry.payload, json!({"v": 2}));
    }

    #[test]
    fn test_upsert_is_linearizable_across_threads() {
        use std::sync::Arc;

        let store = Arc::new(RecordStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.upsert("meeting:1", json!({}), "h1"))
            })
            .collect();

        let changed: usize = handles
            .into_iter()
            .map(|h| usize::from(h.join().unwrap()))
            .sum();
        // exactly one writer observed a change for the same id+hash
        assert_eq!(changed, 1);
        assert_eq!(store.len(), 1);
    }
}

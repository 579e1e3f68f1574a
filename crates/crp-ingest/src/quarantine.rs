//! Quarantine log for records that fail validation
//!
//! Append-only: every schema violation produces exactly one entry carrying
//! the rejected payload verbatim so the record can be replayed after triage.
//! The pipeline never mutates or deletes entries; retention is an external
//! policy.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Mutex;
use uuid::Uuid;

/// One rejected record.
#[derive(Debug, Clone, Serialize)]
pub struct QuarantineRecord {
    pub id: Uuid,
    pub stable_id: String,
    /// Human-readable validation failure description, never empty
    pub reason: String,
    /// The rejected payload, verbatim, for replay
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

/// Append-only sink for validation failures.
#[derive(Debug, Default)]
pub struct QuarantineLog {
    entries: Mutex<Vec<QuarantineRecord>>,
}

impl QuarantineLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, stable_id: &str, reason: &str, payload: Value) {
        let entry = QuarantineRecord {
            id: Uuid::new_v4(),
            stable_id: stable_id.to_string(),
            reason: reason.to_string(),
            payload,
            timestamp: Utc::now(),
        };
        self.entries
            .lock()
            .expect("quarantine lock poisoned")
            .push(entry);
    }

    /// Copy of the current entries, for triage and tests.
    pub fn snapshot(&self) -> Vec<QuarantineRecord> {
        self.entries
            .lock()
            .expect("quarantine lock poisoned")
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("quarantine lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

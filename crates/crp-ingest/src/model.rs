//! Core data model for the ingestion pipeline
//!
//! Three shapes move through a run: `DiscoveredItem` (a candidate unit of
//! work, pre-fetch), `RawFetch` (retrieved bytes plus transport metadata)
//! and `NormalizedRecord` (the pipeline's unit of currency). The first two
//! are transient and scoped to a single pass over one item; a normalized
//! record either lands in the dedup store or in quarantine, never both.

use chrono::{DateTime, Utc};
use crp_common::types::{Provenance, RecordType, RobotsPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Candidate unit of work produced by `discover`, before any content fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredItem {
    /// Opaque, source-namespaced identifier, unique within one source
    pub stable_id: String,
    /// Authoritative address for the item
    pub canonical_url: String,
    /// Opaque key/value bag carried from discovery (a scraped title, an API
    /// row)
    pub metadata: serde_json::Value,
}

/// Raw retrieved bytes plus transport metadata, produced by `fetch`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFetch {
    pub body: Vec<u8>,
    /// Case-sensitive header map; includes an `ETag` entry where one is
    /// available for change detection
    pub headers: HashMap<String, String>,
    pub robots_policy: RobotsPolicy,
}

impl RawFetch {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// A normalized record ready for validation.
///
/// `content_hash` is always recomputed from the originating body, never
/// trusted from upstream headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub record_type: RecordType,
    pub stable_id: String,
    pub canonical_url: String,
    /// Type-specific key/value bag matching the schema for `record_type`
    pub payload: serde_json::Value,
    /// Identity of the adapter that produced this record
    pub source_id: String,
    pub content_hash: String,
    pub retrieved_at: DateTime<Utc>,
    pub robots_policy: RobotsPolicy,
}

impl NormalizedRecord {
    /// Provenance tuple handed to the audit sink and the persistent store.
    pub fn provenance(&self) -> Provenance {
        Provenance {
            source_id: self.source_id.clone(),
            content_hash: self.content_hash.clone(),
            retrieved_at: self.retrieved_at,
            robots_policy: self.robots_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provenance_mirrors_record_fields() {
        let record = NormalizedRecord {
            record_type: RecordType::Meeting,
            stable_id: "meeting:1".to_string(),
            canonical_url: "https://example.org/MeetingDetail.aspx?ID=1".to_string(),
            payload: json!({"id": "meeting:1"}),
            source_id: "county_legistar_api".to_string(),
            content_hash: crp_common::content_hash(b"{}"),
            retrieved_at: Utc::now(),
            robots_policy: RobotsPolicy::Allow,
        };

        let prov = record.provenance();
        assert_eq!(prov.source_id, record.source_id);
        assert_eq!(prov.content_hash, record.content_hash);
        assert_eq!(prov.robots_policy, RobotsPolicy::Allow);
    }

    #[test]
    fn test_raw_fetch_header_lookup_is_case_sensitive() {
        let mut headers = HashMap::new();
        headers.insert("ETag".to_string(), "abc".to_string());
        let raw = RawFetch {
            body: Vec::new(),
            headers,
            robots_policy: RobotsPolicy::Allow,
        };
        assert_eq!(raw.header("ETag"), Some("abc"));
        assert_eq!(raw.header("etag"), None);
    }
}

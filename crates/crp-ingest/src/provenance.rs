//! Fetch audit trail
//!
//! One event per successful fetch, recorded before parsing and independent
//! of validation outcome. Downstream provenance consumers read this to
//! answer "where did this byte stream come from, when, and under what usage
//! policy".

use chrono::{DateTime, Utc};
use crp_common::types::RobotsPolicy;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

/// Transport-level provenance for one successful fetch.
#[derive(Debug, Clone, Serialize)]
pub struct FetchAuditEvent {
    pub source_id: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub robots_policy: RobotsPolicy,
    pub fetched_at: DateTime<Utc>,
}

/// Append-only audit sink.
#[derive(Debug, Default)]
pub struct AuditLog {
    events: Mutex<Vec<FetchAuditEvent>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &self,
        source_id: &str,
        url: &str,
        headers: &HashMap<String, String>,
        robots_policy: RobotsPolicy,
    ) {
        let event = FetchAuditEvent {
            source_id: source_id.to_string(),
            url: url.to_string(),
            headers: headers.clone(),
            robots_policy,
            fetched_at: Utc::now(),
        };
        self.events.lock().expect("audit lock poisoned").push(event);
    }

    pub fn snapshot(&self) -> Vec<FetchAuditEvent> {
        self.events.lock().expect("audit lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("audit lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_captures_policy_and_headers() {
        let log = AuditLog::new();
        let mut headers = HashMap::new();
        headers.insert("ETag".to_string(), "abc123".to_string());

        log.record(
            "local_rss",
            "https://example.org/feed.xml",
            &headers,
            RobotsPolicy::AllowSnippet,
        );

        let events = log.snapshot();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source_id, "local_rss");
        assert_eq!(events[0].robots_policy, RobotsPolicy::AllowSnippet);
        assert_eq!(events[0].headers.get("ETag").map(String::as_str), Some("abc123"));
    }
}

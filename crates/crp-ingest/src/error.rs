//! Error types for the ingestion pipeline
//!
//! Propagation policy: only `SourceUnavailable` crosses the pipeline
//! boundary (fatal for one adapter's run). Fetch failures are absorbed as
//! item skips; schema violations are absorbed into quarantine. No single
//! bad record can fail a run.

use thiserror::Error;

/// Errors raised by adapters and the validator.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Listing-level failure: the source's index/feed could not be
    /// retrieved. Fatal for the current run; retry policy belongs to the
    /// scheduler.
    #[error("source unavailable for {source_id}: {reason}")]
    SourceUnavailable { source_id: String, reason: String },

    /// Item-level transport failure; the item is skipped, the run continues.
    #[error("fetch failed for {stable_id}: {reason}")]
    FetchFailed { stable_id: String, reason: String },

    /// Record-level structural failure; the record is quarantined.
    #[error("schema violation in `{field}`: {reason}")]
    SchemaViolation { field: String, reason: String },

    /// Malformed content that could not be turned into records.
    #[error("parse error: {0}")]
    Parse(String),
}

impl IngestError {
    pub fn source_unavailable(source_id: impl Into<String>, reason: impl Into<String>) -> Self {
        IngestError::SourceUnavailable {
            source_id: source_id.into(),
            reason: reason.into(),
        }
    }

    pub fn fetch_failed(stable_id: impl Into<String>, reason: impl Into<String>) -> Self {
        IngestError::FetchFailed {
            stable_id: stable_id.into(),
            reason: reason.into(),
        }
    }

    pub fn schema_violation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        IngestError::SchemaViolation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

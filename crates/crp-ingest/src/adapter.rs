//! The source adapter contract
//!
//! One implementation per upstream source kind. Adapters are small structs
//! holding only their configuration plus an HTTP client; all polymorphism
//! goes through this trait rather than any inheritance of behavior.

use async_trait::async_trait;

use crate::error::IngestError;
use crate::model::{DiscoveredItem, NormalizedRecord, RawFetch};

/// Capability contract every source adapter implements.
///
/// The pipeline drives the four operations strictly in order per discovered
/// item: `discover` → `fetch` → `parse` → `link`. Adapters are the only
/// components permitted to perform network I/O, and only `discover` and
/// `fetch` may do so.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Identity string used to namespace stable ids and attribute
    /// provenance. Disjoint across adapters.
    fn source_id(&self) -> &str;

    /// Enumerate candidate work items from the upstream listing. Must not
    /// fetch full content. Fails with `SourceUnavailable` when the listing
    /// cannot be retrieved; the pipeline treats that as fatal for this run.
    async fn discover(&self) -> Result<Vec<DiscoveredItem>, IngestError>;

    /// Retrieve the full content for one item. Idempotent. A failure means
    /// "skip this item"; it never aborts the run.
    async fn fetch(&self, item: &DiscoveredItem) -> Result<RawFetch, IngestError>;

    /// Convert raw bytes into zero or more normalized records. Pure: no
    /// network or storage access.
    fn parse(&self, raw: &RawFetch) -> Result<Vec<NormalizedRecord>, IngestError>;

    /// Final pass allowed to rewrite or enrich records using only the
    /// records produced within the same `parse` batch (e.g. back-filling a
    /// parent reference). Pure. Default: identity.
    fn link(&self, records: Vec<NormalizedRecord>) -> Vec<NormalizedRecord> {
        records
    }
}

/// Truncate to at most `max` characters, respecting char boundaries.
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

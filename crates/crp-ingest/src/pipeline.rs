//! Ingestion pipeline orchestrator
//!
//! Drives one adapter through discover → fetch → parse → link → validate →
//! dedup → store-or-quarantine and returns per-run counters. Item-level
//! failures are absorbed locally; only discovery-level failure surfaces to
//! the caller. There is no retry here; backoff across runs belongs to the
//! scheduler.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adapter::SourceAdapter;
use crate::error::IngestError;
use crate::model::DiscoveredItem;
use crate::provenance::AuditLog;
use crate::quarantine::QuarantineLog;
use crate::schema;
use crate::store::RecordStore;

/// Tuning knobs for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Bound on concurrent per-item work within one adapter run
    pub fetch_concurrency: usize,
    /// Budget for the whole discovery call; exceeding it is a
    /// `SourceUnavailable`
    pub discover_timeout: Duration,
    /// Budget for one item's fetch; exceeding it skips the item
    pub fetch_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: 4,
            discover_timeout: Duration::from_secs(20),
            fetch_timeout: Duration::from_secs(20),
        }
    }
}

/// Per-run counters. `skipped` tracks items lost to transport failures and
/// cancellation; it is never folded into `errors`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub inserted: u64,
    pub duplicates: u64,
    pub errors: u64,
    pub skipped: u64,
}

impl RunStats {
    pub fn merge(&mut self, other: &RunStats) {
        self.inserted += other.inserted;
        self.duplicates += other.duplicates;
        self.errors += other.errors;
        self.skipped += other.skipped;
    }
}

/// The orchestrator. Holds the run-scoped dedup store, the quarantine log
/// and the fetch audit trail; safe to share across concurrently running
/// adapters because stable ids are namespaced per source.
pub struct IngestionPipeline {
    store: Arc<RecordStore>,
    quarantine: Arc<QuarantineLog>,
    audit: Arc<AuditLog>,
    config: PipelineConfig,
    cancel: CancellationToken,
}

impl Default for IngestionPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl IngestionPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            store: Arc::new(RecordStore::new()),
            quarantine: Arc::new(QuarantineLog::new()),
            audit: Arc::new(AuditLog::new()),
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn quarantine(&self) -> &QuarantineLog {
        &self.quarantine
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Token observed before each new fetch. Cancelling stops new work
    /// promptly; effects already committed stand.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run one adapter to completion and return its counters.
    pub async fn run(&self, adapter: &dyn SourceAdapter) -> Result<RunStats, IngestError> {
        let source_id = adapter.source_id().to_string();

        let items = match timeout(self.config.discover_timeout, adapter.discover()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(IngestError::source_unavailable(
                    &source_id,
                    "discovery timed out",
                ))
            },
        };
        info!(source_id = %source_id, items = items.len(), "discovery complete");

        let stats = stream::iter(items)
            .map(|item| self.process_item(adapter, item))
            .buffer_unordered(self.config.fetch_concurrency.max(1))
            .fold(RunStats::default(), |mut acc, part| async move {
                acc.merge(&part);
                acc
            })
            .await;

        info!(
            source_id = %source_id,
            inserted = stats.inserted,
            duplicates = stats.duplicates,
            errors = stats.errors,
            skipped = stats.skipped,
            "ingestion run complete"
        );
        Ok(stats)
    }

    /// One item's pass: fetch, audit, parse, link, then validate each
    /// record into the store or quarantine. Always returns counters, never
    /// an error.
    async fn process_item(&self, adapter: &dyn SourceAdapter, item: DiscoveredItem) -> RunStats {
        let mut stats = RunStats::default();

        if self.cancel.is_cancelled() {
            stats.skipped += 1;
            return stats;
        }

        let raw = match timeout(self.config.fetch_timeout, adapter.fetch(&item)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => {
                warn!(stable_id = %item.stable_id, error = %err, "fetch failed, skipping item");
                stats.skipped += 1;
                return stats;
            },
            Err(_) => {
                warn!(stable_id = %item.stable_id, "fetch timed out, skipping item");
                stats.skipped += 1;
                return stats;
            },
        };

        self.audit.record(
            adapter.source_id(),
            &item.canonical_url,
            &raw.headers,
            raw.robots_policy,
        );

        let records = match adapter.parse(&raw) {
            Ok(records) => records,
            Err(err) => {
                warn!(stable_id = %item.stable_id, error = %err, "parse failed, skipping item");
                stats.skipped += 1;
                return stats;
            },
        };
        let records = adapter.link(records);

        for record in records {
            match schema::validate(&record) {
                Ok(()) => {
                    let changed =
                        self.store
                            .upsert(&record.stable_id, record.payload, &record.content_hash);
                    if changed {
                        debug!(stable_id = %record.stable_id, "record inserted");
                        stats.inserted += 1;
                    } else {
                        debug!(stable_id = %record.stable_id, "unchanged content, deduplicated");
                        stats.duplicates += 1;
                    }
                },
                Err(err) => {
                    warn!(stable_id = %record.stable_id, error = %err, "record quarantined");
                    self.quarantine
                        .record(&record.stable_id, &err.to_string(), record.payload);
                    stats.errors += 1;
                },
            }
        }
        stats
    }
}

//! CRP Ingest Library
//!
//! Ingestion pipeline for heterogeneous public-records sources: one adapter
//! per source kind (JSON API, scraped HTML, RSS, GIS datasets), a shared
//! discover → fetch → parse → link contract, content-hash deduplication,
//! schema validation and quarantine of malformed records.
//!
//! # Example
//!
//! ```no_run
//! use crp_ingest::adapters::LegistarApiAdapter;
//! use crp_ingest::pipeline::IngestionPipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let adapter = LegistarApiAdapter::new(
//!         "county_legistar_api",
//!         "https://webapi.legistar.com/v1/county",
//!     );
//!     let pipeline = IngestionPipeline::default();
//!     let stats = pipeline.run(&adapter).await?;
//!     println!("inserted {} records", stats.inserted);
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod adapters;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod provenance;
pub mod quarantine;
pub mod schema;
pub mod store;

// Re-export the types most callers need
pub use adapter::SourceAdapter;
pub use error::IngestError;
pub use model::{DiscoveredItem, NormalizedRecord, RawFetch};
pub use pipeline::{IngestionPipeline, PipelineConfig, RunStats};

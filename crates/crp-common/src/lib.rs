//! CRP Common Library
//!
//! Shared types and utilities for the Civic Records Pipeline workspace:
//!
//! - **Error Handling**: the workspace-wide error and result types
//! - **Content Addressing**: SHA-256 digests of raw fetched bytes
//! - **Logging**: tracing initialization shared by every binary
//! - **Types**: record-type and provenance vocabulary

pub mod error;
pub mod hash;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{CrpError, Result};
pub use hash::content_hash;

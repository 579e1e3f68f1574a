//! Content addressing for fetched payloads
//!
//! Every record carries a SHA-256 digest of the raw bytes it was parsed
//! from. The digest drives change detection (an unchanged re-fetch is a
//! no-op) and supplies a stable suffix for sources that expose no natural
//! identifier.

use sha2::{Digest, Sha256};

/// Compute the hex-encoded SHA-256 digest of raw bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Truncated digest prefix, used to namespace identifiers for sources
/// without a natural stable id (e.g. scraped pages, static datasets).
pub fn short_hash(bytes: &[u8], len: usize) -> String {
    let mut digest = content_hash(bytes);
    digest.truncate(len);
    digest
}

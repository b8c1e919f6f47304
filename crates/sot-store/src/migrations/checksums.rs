//! Checksum validation for migrations
//!
//! Computes SHA256 checksums of migration SQL so an index created by a
//! different build of the schema is detected instead of silently reused.

use sha2::{Digest, Sha256};

/// Compute SHA256 checksum of a string
pub fn compute_checksum(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Whether a recorded checksum matches the embedded SQL
pub fn matches(recorded: Option<&str>, sql: &str) -> bool {
    match recorded {
        Some(recorded) => recorded == compute_checksum(sql),
        // Rows written without a checksum are accepted as-is
        None => true,
    }
}

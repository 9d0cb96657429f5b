//! Content hashing for change detection and dedup

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `content`
pub fn content_hash(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

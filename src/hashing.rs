//! Content hashing for deduplication.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `input`.
pub fn sha256_hex(input: impl AsRef<[u8]>) -> String {
    format!("{:x}", Sha256::digest(input.as_ref()))
}

/// Hash of the trimmed text. Leading and trailing whitespace never affects it.
pub fn content_hash(text: &str) -> String {
    sha256_hex(text.trim())
}

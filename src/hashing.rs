//! Hashing - SHA-256 digests
//!
//! Rendered files are reported with their content digest, and digests
//! fetched from the checksum endpoint are checked for shape before they
//! land in a Dockerfile.

use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// True for a 64 character lowercase or uppercase hex string.
pub fn is_sha256_hex(digest: &str) -> bool {
    digest.len() == 64 && hex::decode(digest).is_ok()
}

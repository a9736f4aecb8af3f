//! SHA-256 checksums of migration SQL, recorded when a migration is applied

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `content`
pub fn compute_checksum(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

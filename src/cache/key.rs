//! Cache key derivation.

use sha2::{Digest, Sha256};

/// Compute a SHA-256 hash of the license key for use as cache key.
///
/// This avoids holding raw license keys in memory maps and log lines.
pub fn hash_license_key(license_key: &str) -> String {
    let hash = Sha256::digest(license_key.as_bytes());
    hex::encode(hash)
}

const LOG_ID_CHARS: usize = 12;

/// Short prefix of a key suitable for log fields.
///
/// Cuts on a character boundary, so any key is accepted.
pub fn log_id(key: &str) -> &str {
    key.char_indices()
        .nth(LOG_ID_CHARS)
        .map_or(key, |(end, _)| &key[..end])
}

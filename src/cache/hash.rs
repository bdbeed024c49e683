//! Content hashing for cache keys.

use sha2::{Digest, Sha256};

/// SHA-256 over length-prefixed parts, as lowercase hex.
///
/// Length prefixes keep `("ab", "c")` and `("a", "bc")` apart.
pub fn hash_parts(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Cache key for one enumeration lookup.
pub fn enumeration_key(endpoint: &str, variable: &str, query: &str) -> String {
    hash_parts(&[endpoint, variable, query])
}

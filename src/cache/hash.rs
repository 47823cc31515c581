//! Content hashing for cache keys.

use sha2::{Digest, Sha256};

/// Cache key for a query text.
///
/// Surrounding whitespace is ignored, everything else (case included) is
/// significant. Returns a 64-character lowercase hexadecimal string.
pub fn query_key(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.trim().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Cache key for a query text parsed under `scope`.
///
/// The scope names the parsing configuration, so parses made with and
/// without a delegate never answer for each other.
pub fn scoped_key(scope: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(scope.as_bytes());
    hasher.update([0u8]);
    hasher.update(text.trim().as_bytes());
    format!("{:x}", hasher.finalize())
}

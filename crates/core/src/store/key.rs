//! Request key generation.

use sha2::{Digest, Sha256};

/// Compute the store key for a request.
///
/// Keys are derived from the method and the full URL so that the same
/// resource fetched with a different method never collides.
pub fn compute_request_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

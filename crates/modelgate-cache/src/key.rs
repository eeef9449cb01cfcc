//! Request fingerprinting.

use modelgate_core::LlmRequest;
use sha2::{Digest, Sha256};

/// Computes the default cache key: SHA-256 hex over the stable JSON
/// serialization of the request.
///
/// The request types serialize with a fixed field order, so equal requests
/// always fingerprint identically. Serialization failure yields `None`,
/// which disables caching for that call without failing it.
pub fn fingerprint(request: &LlmRequest) -> Option<String> {
    let bytes = serde_json::to_vec(request).ok()?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Some(hex::encode(hasher.finalize()))
}

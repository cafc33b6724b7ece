//! Content fingerprints for change detection.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Compute SHA256 hash of bytes.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Fingerprint a serializable value through its compact JSON form.
///
/// Two documents that load to the same model get the same fingerprint,
/// regardless of whitespace in the source file.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> crate::Result<String> {
    let canonical = serde_json::to_vec(value)?;
    Ok(sha256_bytes(&canonical))
}

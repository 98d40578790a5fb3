//! Stable digests for cache partitioning.
//!
//! State keys and parameter hashes end up inside cache keys, so they must be
//! identical across processes for identical input. JSON values are digested
//! after a round-trip through [`serde_json::Value`], whose object map keeps
//! keys sorted.

use serde::Serialize;

use crate::error::Result;

/// Uppercase hex blake3 digest of raw bytes.
///
/// ```
/// use vitrine_core::util::digest::digest_bytes;
///
/// let a = digest_bytes(b"color=red");
/// assert_eq!(a, digest_bytes(b"color=red"));
/// assert_eq!(a.len(), 64);
/// assert_eq!(a, a.to_uppercase());
/// ```
pub fn digest_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_ascii_uppercase()
}

/// Digest of the canonical JSON encoding of `value`.
pub fn digest_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let canonical = serde_json::to_value(value)?;
    let encoded = serde_json::to_vec(&canonical)?;
    Ok(digest_bytes(&encoded))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_digest_is_stable() {
        assert_eq!(digest_bytes(b""), digest_bytes(b""));
        assert_ne!(digest_bytes(b"a"), digest_bytes(b"b"));
    }

    #[test]
    fn test_json_digest_ignores_insertion_order() {
        let mut first = HashMap::new();
        first.insert("store_id", json!(1));
        first.insert("category", json!(3));

        let mut second = HashMap::new();
        second.insert("category", json!(3));
        second.insert("store_id", json!(1));

        assert_eq!(digest_json(&first).unwrap(), digest_json(&second).unwrap());
    }

    #[test]
    fn test_json_digest_distinguishes_values() {
        let a = digest_json(&json!({"price": {"from": 10}})).unwrap();
        let b = digest_json(&json!({"price": {"from": 20}})).unwrap();
        assert_ne!(a, b);
    }
}

//! Stable JSON canonicalization and content addressing.
//!
//! Every stage input/output, cache key, and paper fingerprint goes through
//! `canonicalize` before hashing, so that key order and float formatting
//! never change a hash. One hash function is shared by the whole workspace
//! (sha2-256, hex-encoded) so a hash computed by one crate is comparable to
//! one computed by another.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Recursively sort object keys, preserve array order, and reject NaN/Infinity.
/// Nulls are kept explicit (never collapsed to "absent").
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map
                .iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                if !f.is_finite() {
                    // NaN/Infinity have no canonical JSON representation;
                    // collapse to null rather than produce invalid output.
                    return Value::Null;
                }
            }
            value.clone()
        }
        other => other.clone(),
    }
}

/// Canonicalize and serialize to a stable byte string.
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    serde_json::to_vec(&canonicalize(value)).expect("canonical JSON serialization cannot fail")
}

/// Hash any serializable value via canonical JSON + sha2-256, rendered as hex.
/// This is the one hash function shared by input_hash, output_hash, and every
/// cache/fingerprint key in the workspace.
pub fn content_hash_value(value: &Value) -> String {
    let bytes = canonical_bytes(value);
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}

/// Convenience wrapper for hashing a `Serialize` value directly.
pub fn content_hash<T: serde::Serialize>(value: &T) -> String {
    let json = serde_json::to_value(value).expect("value must serialize to JSON");
    content_hash_value(&json)
}

/// Hash raw string content (used for fingerprints built from plain strings,
/// e.g. `fingerprint(normalized_title, year, normalized_doi)`).
pub fn content_hash_str(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())
}

/// 32-bit FNV-1a, used only for citation-anchor `snippet_hash` values where a
/// short, fast, non-cryptographic fingerprint is sufficient (open question in
/// the design notes; resolved here to match the one FNV-like variant observed
/// in comparable codebases — see DESIGN.md).
pub fn fnv1a_32(s: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in s.as_bytes() {
        hash ^= *byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonicalize_sorts_object_keys() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(canonical_bytes(&a), canonical_bytes(&b));
    }

    #[test]
    fn canonicalize_preserves_array_order() {
        let a = json!([3, 1, 2]);
        let b = json!([1, 2, 3]);
        assert_ne!(canonical_bytes(&a), canonical_bytes(&b));
    }

    #[test]
    fn canonicalize_handles_nested_structures() {
        let a = json!({"x": [{"b": 1, "a": 2}], "y": null});
        let b = json!({"y": null, "x": [{"a": 2, "b": 1}]});
        assert_eq!(content_hash_value(&a), content_hash_value(&b));
    }

    #[test]
    fn content_hash_is_deterministic() {
        let v = json!({"question": "does X help Y", "seed": 7});
        assert_eq!(content_hash_value(&v), content_hash_value(&v));
    }

    #[test]
    fn different_inputs_hash_differently() {
        let a = json!({"q": "a"});
        let b = json!({"q": "b"});
        assert_ne!(content_hash_value(&a), content_hash_value(&b));
    }

    #[test]
    fn fnv1a_is_stable_across_calls() {
        assert_eq!(fnv1a_32("hello world"), fnv1a_32("hello world"));
        assert_ne!(fnv1a_32("hello world"), fnv1a_32("hello worlds"));
    }
}

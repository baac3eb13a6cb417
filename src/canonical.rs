//! Canonical serialization for population fingerprints and cache keys.
//!
//! ## Determinism Guarantees
//!
//! - Struct fields serialize in declaration order
//! - Vectors serialize in index order
//! - Maps must be BTreeMap (HashMap iteration order is not stable)

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes for hashing.
///
/// Only used on types made of strings, integers, enums and ordered
/// collections, for which JSON serialization cannot fail.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Compute the xxh64 hash of a value's canonical bytes.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    xxh64(&to_canonical_bytes(value), 0)
}

/// Compute canonical hash and return as a 16-digit hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_determinism() {
        let mut a = BTreeMap::new();
        a.insert("W", 20u32);
        a.insert("S", 20u32);

        let mut b = BTreeMap::new();
        b.insert("S", 20u32);
        b.insert("W", 20u32);

        assert_eq!(canonical_hash(&a), canonical_hash(&b));
        assert_eq!(canonical_hash_hex(&a).len(), 16);
    }

    #[test]
    fn test_distinct_values_distinct_hashes() {
        assert_ne!(canonical_hash(&(5000u32, true)), canonical_hash(&(5000u32, false)));
    }
}

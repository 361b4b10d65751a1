//! Payload Hashing
//!
//! Deterministic, domain-separated SHA-256 hashing for:
//! - Score payload digests (what the score signer signs)
//! - Label-derived addresses
//!
//! All integers are encoded little-endian. Order of updates is part of the
//! wire format and must never change without bumping the domain tag.

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes)
pub type Hash32 = [u8; 32];

/// Deterministic hasher for signed payloads.
///
/// Wraps SHA-256 with fixed-width integer helpers.
pub struct PayloadHasher {
    hasher: Sha256,
}

impl PayloadHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a 32-byte identifier.
    #[inline]
    pub fn update_id(&mut self, id: &[u8; 32]) {
        self.hasher.update(id);
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> Hash32 {
        self.hasher.finalize().into()
    }
}

/// Compute a simple hash of arbitrary data.
#[cfg(test)]
pub fn hash_bytes(data: &[u8]) -> Hash32 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute hash with domain separator.
pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Hash32 {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_hasher_determinism() {
        let make_hash = || {
            let mut hasher = PayloadHasher::new(b"test");
            hasher.update_u64(100);
            hasher.update_id(&[7; 32]);
            hasher.update_bytes(b"abc");
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = PayloadHasher::new(b"test");
            h.update_u64(1);
            h.update_u64(2);
            h.finalize()
        };

        let hash2 = {
            let mut h = PayloadHasher::new(b"test");
            h.update_u64(2);
            h.update_u64(1);
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_domain_separation() {
        let data = [1u8, 2, 3, 4];

        let hash1 = hash_with_domain(b"DOMAIN_A", &data);
        let hash2 = hash_with_domain(b"DOMAIN_B", &data);

        assert_ne!(hash1, hash2);
        assert_ne!(hash1, hash_bytes(&data));
    }

    #[test]
    fn test_hasher_matches_manual_concat() {
        let mut h = PayloadHasher::new(b"D");
        h.update_u64(5);
        let mut manual = b"D".to_vec();
        manual.extend_from_slice(&5u64.to_le_bytes());
        assert_eq!(h.finalize(), hash_bytes(&manual));
    }
}

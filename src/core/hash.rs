// Hashing utilities

use crate::core::Hash256;
use sha2::{Digest, Sha256};

/// Single SHA256 hash, the digest behind every id on this chain
pub fn sha256(data: &[u8]) -> Hash256 {
    let digest = Sha256::digest(data);
    Hash256::from_slice(&digest).expect("SHA256 always returns 32 bytes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_deterministic() {
        let hash = sha256(b"hello world");
        assert_eq!(hash, sha256(b"hello world"));
        assert_ne!(hash, sha256(b"hello worlD"));
    }

    #[test]
    fn test_sha256_known_vector() {
        // SHA256 of the empty string
        assert_eq!(
            sha256(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}

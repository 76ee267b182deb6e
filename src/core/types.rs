// Basic types for the crowdfunding chain

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::core::encode;

/// 256-bit digest (32 bytes).
/// Used for block hashes, transaction ids and contract addresses.
/// Serializes as an unpadded base64 string, like every byte field on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// Create a new Hash256 from a byte array
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create a Hash256 from a slice
    pub fn from_slice(slice: &[u8]) -> Result<Self, String> {
        if slice.len() != 32 {
            return Err(format!("Invalid hash length: expected 32, got {}", slice.len()));
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Get the hash as a byte slice
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The all-zero sentinel (genesis prev hash, coinbase input id)
    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Whether this is the all-zero sentinel
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Convert to hex string for logs and CLI output
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode::to_base64(&self.0))
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = encode::from_base64(&text).map_err(serde::de::Error::custom)?;
        Hash256::from_slice(&bytes).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash256_creation() {
        let hash = Hash256::new([1u8; 32]);
        assert_eq!(hash.as_bytes(), &[1u8; 32]);
    }

    #[test]
    fn test_hash256_zero() {
        let zero = Hash256::zero();
        assert!(zero.is_zero());
        assert_eq!(zero.as_bytes(), &[0u8; 32]);
    }

    #[test]
    fn test_hash256_json_round_trip() {
        let hash = Hash256::new([0xAB; 32]);
        let json = serde_json::to_string(&hash).unwrap();
        // 32 bytes encode to 43 base64 characters, no padding
        assert_eq!(json.len(), 45);
        let decoded: Hash256 = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, decoded);
    }

    #[test]
    fn test_hash256_rejects_wrong_length() {
        let err = serde_json::from_str::<Hash256>("\"AAAA\"");
        assert!(err.is_err());
    }
}

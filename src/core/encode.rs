// Canonical encoding for hashing, signing and the wire

use base64::Engine;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use serde::Serialize;

/// Encode bytes as standard-alphabet base64 without padding
pub fn to_base64(data: &[u8]) -> String {
    STANDARD_NO_PAD.encode(data)
}

/// Decode unpadded standard-alphabet base64
pub fn from_base64(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD_NO_PAD.decode(text)
}

/// Canonical byte encoding of a chain value: compact JSON with fields in
/// struct declaration order. Hashes and signatures are computed over these
/// bytes, so the encoding must stay stable.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("chain values always encode to JSON")
}

/// Serde helper for byte fields: unpadded base64 strings in JSON.
/// Use as `#[serde(with = "encode::b64")]`.
pub mod b64 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_base64(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::from_base64(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_no_padding() {
        assert_eq!(to_base64(b"coinbase-marker"), "Y29pbmJhc2UtbWFya2Vy");
        assert_eq!(to_base64(&[0u8; 32]), "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
    }

    #[test]
    fn test_base64_round_trip() {
        let data = vec![0u8, 1, 2, 253, 254, 255];
        assert_eq!(from_base64(&to_base64(&data)).unwrap(), data);
    }

    #[test]
    fn test_canonical_bytes_are_compact() {
        #[derive(serde::Serialize)]
        struct Probe {
            amount: u64,
            #[serde(with = "b64")]
            pub_key: Vec<u8>,
        }
        let probe = Probe { amount: 100, pub_key: vec![1, 2, 3] };
        assert_eq!(to_canonical_bytes(&probe), br#"{"amount":100,"pub_key":"AQID"}"#);
    }
}

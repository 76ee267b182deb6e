// Crowdfunding contract data structures

use serde::{Deserialize, Serialize};

use crate::core::{Hash256, encode, hash::sha256};

/// A crowdfunding contract. Its id doubles as the escrow address deposits
/// pay into, so the id covers every field except the owner signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    /// Registration time in milliseconds
    pub timestamp: i64,
    /// Funding deadline in milliseconds
    pub deadline: i64,
    /// Funding goal
    pub goal: u64,
    /// SPKI DER public key of the project owner
    #[serde(with = "encode::b64")]
    pub owner_pub_key: Vec<u8>,
    pub title: String,
    pub description: String,
    /// Owner signature over the canonical unsigned contract bytes
    #[serde(with = "encode::b64")]
    pub signature: Vec<u8>,
}

impl Contract {
    /// Contract id: SHA256 of the canonical unsigned contract bytes
    pub fn id(&self) -> Hash256 {
        sha256(&self.to_unsigned().to_bytes())
    }

    pub fn to_unsigned(&self) -> UnsignedContract {
        UnsignedContract {
            timestamp: self.timestamp,
            deadline: self.deadline,
            goal: self.goal,
            owner_pub_key: self.owner_pub_key.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }
}

/// Contract without the owner signature, the message the owner signs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedContract {
    pub timestamp: i64,
    pub deadline: i64,
    pub goal: u64,
    #[serde(with = "encode::b64")]
    pub owner_pub_key: Vec<u8>,
    pub title: String,
    pub description: String,
}

impl UnsignedContract {
    /// Canonical bytes to sign
    pub fn to_bytes(&self) -> Vec<u8> {
        encode::to_canonical_bytes(self)
    }

    pub fn into_signed(self, signature: Vec<u8>) -> Contract {
        Contract {
            timestamp: self.timestamp,
            deadline: self.deadline,
            goal: self.goal,
            owner_pub_key: self.owner_pub_key,
            title: self.title,
            description: self.description,
            signature,
        }
    }
}

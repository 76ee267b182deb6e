// Block data structures

use serde::{Deserialize, Serialize};

use crate::core::{Contract, Hash256, Transaction, encode, hash::sha256};

/// Block payload: transactions plus newly registered contracts
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockBody {
    pub transactions: Vec<Transaction>,
    pub contracts: Vec<Contract>,
}

impl BlockBody {
    pub fn new(transactions: Vec<Transaction>, contracts: Vec<Contract>) -> Self {
        Self { transactions, contracts }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Block candidate, not yet mined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: u64,
    pub prev_hash: Hash256,
    pub body: BlockBody,
}

impl Block {
    pub fn new(id: u64, prev_hash: Hash256, body: BlockBody) -> Self {
        Self { id, prev_hash, body }
    }

    /// The genesis candidate: id 1, zero prev hash, empty body
    pub fn genesis() -> Self {
        Self::new(1, Hash256::zero(), BlockBody::empty())
    }

    /// Header hash for a given timestamp and nonce
    pub fn hash_with(&self, timestamp: i64, nonce: u64) -> Hash256 {
        header_hash(self.id, timestamp, &self.prev_hash, nonce, &self.body)
    }

    /// Attach an already computed proof
    pub fn into_hashed(self, timestamp: i64, nonce: u64, hash: Hash256) -> HashedBlock {
        HashedBlock {
            id: self.id,
            prev_hash: self.prev_hash,
            body: self.body,
            timestamp,
            nonce,
            hash,
        }
    }
}

/// Mined block with proof of work attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedBlock {
    pub id: u64,
    pub prev_hash: Hash256,
    pub body: BlockBody,
    /// Mining time in milliseconds, refreshed every nonce attempt
    pub timestamp: i64,
    pub nonce: u64,
    pub hash: Hash256,
}

impl HashedBlock {
    /// Recompute the header hash and compare against the stored one
    pub fn is_header_valid(&self) -> bool {
        header_hash(self.id, self.timestamp, &self.prev_hash, self.nonce, &self.body) == self.hash
    }

    /// Strip the proof, yielding the candidate this block was mined from
    pub fn to_block(&self) -> Block {
        Block::new(self.id, self.prev_hash, self.body.clone())
    }
}

/// The canonical header hash input: id, timestamp, prev hash, nonce, body
#[derive(Serialize)]
struct HeaderInput<'a> {
    id: u64,
    timestamp: i64,
    prev_hash: &'a Hash256,
    nonce: u64,
    body: &'a BlockBody,
}

fn header_hash(id: u64, timestamp: i64, prev_hash: &Hash256, nonce: u64, body: &BlockBody) -> Hash256 {
    let input = HeaderInput { id, timestamp, prev_hash, nonce, body };
    sha256(&encode::to_canonical_bytes(&input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_shape() {
        let genesis = Block::genesis();
        assert_eq!(genesis.id, 1);
        assert_eq!(genesis.prev_hash, Hash256::zero());
        assert!(genesis.body.transactions.is_empty());
        assert!(genesis.body.contracts.is_empty());
    }

    #[test]
    fn test_header_round_trip() {
        let block = Block::genesis();
        let hash = block.hash_with(1_234, 42);
        let hashed = block.into_hashed(1_234, 42, hash);
        assert!(hashed.is_header_valid());
    }

    #[test]
    fn test_header_detects_tampering() {
        let block = Block::genesis();
        let hash = block.hash_with(1_234, 42);
        let mut hashed = block.into_hashed(1_234, 42, hash);
        hashed.nonce = 43;
        assert!(!hashed.is_header_valid());

        let block = Block::genesis();
        let hash = block.hash_with(1_234, 42);
        let mut hashed = block.into_hashed(1_234, 42, hash);
        hashed.timestamp += 1;
        assert!(!hashed.is_header_valid());
    }

    #[test]
    fn test_hash_depends_on_body() {
        let empty = Block::genesis();
        let tx = Transaction::coinbase(7, 100, b"m", vec![1]);
        let full = Block::new(1, Hash256::zero(), BlockBody::new(vec![tx], Vec::new()));
        assert_ne!(empty.hash_with(1, 0), full.hash_with(1, 0));
    }

    #[test]
    fn test_json_round_trip() {
        let block = Block::genesis();
        let hash = block.hash_with(99, 7);
        let hashed = block.into_hashed(99, 7, hash);
        let json = serde_json::to_string(&hashed).unwrap();
        let decoded: HashedBlock = serde_json::from_str(&json).unwrap();
        assert_eq!(hashed, decoded);
        assert!(decoded.is_header_valid());
    }
}

// Transaction data structures

use serde::{Deserialize, Serialize};

use crate::core::{Hash256, encode, hash::sha256};

/// Signed transaction input, referencing an output of a previous transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInput {
    /// Id of the referenced transaction
    pub tx_id: Hash256,
    /// Index of the referenced output
    pub v_out: u32,
    /// RSA signature over the unsigned transaction bytes.
    /// Free-form for coinbase inputs, empty for contract-generated ones.
    #[serde(with = "encode::b64")]
    pub signature: Vec<u8>,
}

impl SignedInput {
    pub fn new(tx_id: Hash256, v_out: u32, signature: Vec<u8>) -> Self {
        Self { tx_id, v_out, signature }
    }

    /// Strip the signature, keeping only the outpoint
    pub fn to_unsigned(&self) -> Input {
        Input { tx_id: self.tx_id, v_out: self.v_out }
    }
}

/// Unsigned input projection, part of the bytes each input signs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub tx_id: Hash256,
    pub v_out: u32,
}

/// Transaction output, paying an amount to a public key or contract address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub amount: u64,
    /// SPKI DER public key, or a 32-byte contract id for escrow deposits
    #[serde(with = "encode::b64")]
    pub pub_key: Vec<u8>,
}

impl Output {
    pub fn new(amount: u64, pub_key: Vec<u8>) -> Self {
        Self { amount, pub_key }
    }
}

/// Transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Creation time in milliseconds. Zero for contract-generated transactions.
    pub timestamp: i64,
    pub inputs: Vec<SignedInput>,
    pub outputs: Vec<Output>,
}

impl Transaction {
    pub fn new(timestamp: i64, inputs: Vec<SignedInput>, outputs: Vec<Output>) -> Self {
        Self { timestamp, inputs, outputs }
    }

    /// Create a coinbase transaction paying the block reward to the miner.
    /// The single input references the zero id and carries free-form marker
    /// bytes instead of a signature.
    pub fn coinbase(timestamp: i64, reward: u64, marker: &[u8], miner_pub_key: Vec<u8>) -> Self {
        Self {
            timestamp,
            inputs: vec![SignedInput::new(Hash256::zero(), 0, marker.to_vec())],
            outputs: vec![Output::new(reward, miner_pub_key)],
        }
    }

    /// Check if this is shaped like a coinbase transaction
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].tx_id.is_zero() && self.inputs[0].v_out == 0
    }

    /// Check if this is formatted like a contract-generated transaction:
    /// zero timestamp and no input carries a signature
    pub fn is_contract_formatted(&self) -> bool {
        self.timestamp == 0 && self.inputs.iter().all(|input| input.signature.is_empty())
    }

    /// Transaction id: SHA256 of the canonical transaction bytes
    pub fn id(&self) -> Hash256 {
        sha256(&encode::to_canonical_bytes(self))
    }

    /// The unsigned projection whose canonical bytes every input signs
    pub fn to_unsigned(&self) -> UnsignedTransaction {
        UnsignedTransaction {
            timestamp: self.timestamp,
            inputs: self.inputs.iter().map(SignedInput::to_unsigned).collect(),
            outputs: self.outputs.clone(),
        }
    }

    /// Total amount paid out
    pub fn output_sum(&self) -> u64 {
        self.outputs.iter().map(|output| output.amount).sum()
    }
}

/// Transaction without input signatures, the message each input signs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub timestamp: i64,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
}

impl UnsignedTransaction {
    pub fn new(timestamp: i64, inputs: Vec<Input>, outputs: Vec<Output>) -> Self {
        Self { timestamp, inputs, outputs }
    }

    /// Canonical bytes to sign
    pub fn to_bytes(&self) -> Vec<u8> {
        encode::to_canonical_bytes(self)
    }

    /// Attach one signature per input, in order
    pub fn into_signed(self, signatures: Vec<Vec<u8>>) -> Transaction {
        debug_assert_eq!(self.inputs.len(), signatures.len());
        let inputs = self
            .inputs
            .into_iter()
            .zip(signatures)
            .map(|(input, signature)| SignedInput::new(input.tx_id, input.v_out, signature))
            .collect();
        Transaction::new(self.timestamp, inputs, self.outputs)
    }
}

/// An output not yet referenced by any input, as reported to wallets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    pub tx_id: Hash256,
    pub v_out: u32,
    pub amount: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coinbase_shape() {
        let tx = Transaction::coinbase(1_000, 100, b"marker", vec![1, 2, 3]);
        assert!(tx.is_coinbase());
        assert!(!tx.is_contract_formatted());
        assert_eq!(tx.inputs.len(), 1);
        assert_eq!(tx.inputs[0].tx_id, Hash256::zero());
        assert_eq!(tx.outputs[0].amount, 100);
    }

    #[test]
    fn test_contract_formatted() {
        let input = SignedInput::new(Hash256::new([7; 32]), 1, Vec::new());
        let tx = Transaction::new(0, vec![input], vec![Output::new(50, vec![1])]);
        assert!(tx.is_contract_formatted());

        let signed = Transaction::new(0, vec![SignedInput::new(Hash256::zero(), 0, vec![9])], vec![]);
        assert!(!signed.is_contract_formatted());
    }

    #[test]
    fn test_id_covers_signatures() {
        let unsigned = UnsignedTransaction::new(
            5,
            vec![Input { tx_id: Hash256::new([1; 32]), v_out: 0 }],
            vec![Output::new(10, vec![4, 5])],
        );
        let a = unsigned.clone().into_signed(vec![vec![1]]);
        let b = unsigned.into_signed(vec![vec![2]]);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_unsigned_bytes_ignore_signatures() {
        let unsigned = UnsignedTransaction::new(
            5,
            vec![Input { tx_id: Hash256::new([1; 32]), v_out: 0 }],
            vec![Output::new(10, vec![4, 5])],
        );
        let a = unsigned.clone().into_signed(vec![vec![1]]);
        let b = unsigned.clone().into_signed(vec![vec![2]]);
        assert_eq!(a.to_unsigned().to_bytes(), b.to_unsigned().to_bytes());
        assert_eq!(a.to_unsigned().to_bytes(), unsigned.to_bytes());
    }

    #[test]
    fn test_json_round_trip() {
        let tx = Transaction::coinbase(42, 100, b"m", vec![0xFF, 0x00]);
        let json = serde_json::to_string(&tx).unwrap();
        let decoded: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, decoded);
        assert_eq!(tx.id(), decoded.id());
    }
}

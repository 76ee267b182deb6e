// Chain state and queries

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

use crate::core::{Block, BlockBody, Contract, Hash256, HashedBlock, Transaction, UnspentOutput};

#[derive(Debug, Error)]
pub enum ChainFileError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("chain file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// An ordered chain of mined blocks. All queries are read-only scans;
/// chains stay small enough that indexes are not worth their bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Chain {
    blocks: Vec<HashedBlock>,
}

impl Chain {
    pub fn new(blocks: Vec<HashedBlock>) -> Self {
        Self { blocks }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a chain from a JSON file
    pub fn load(path: &Path) -> Result<Self, ChainFileError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write the chain as a JSON file
    pub fn save(&self, path: &Path) -> Result<(), ChainFileError> {
        let text = serde_json::to_string(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn blocks(&self) -> &[HashedBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn genesis(&self) -> Option<&HashedBlock> {
        self.blocks.first()
    }

    pub fn tip(&self) -> Option<&HashedBlock> {
        self.blocks.last()
    }

    pub fn push(&mut self, block: HashedBlock) {
        self.blocks.push(block);
    }

    /// The first `len` blocks as an independent chain.
    /// Contract replay runs against the chain as it was before a block.
    pub fn sub_chain(&self, len: usize) -> Chain {
        Chain::new(self.blocks[..len.min(self.blocks.len())].to_vec())
    }

    /// Build the mining candidate on top of the current tip
    pub fn next_block(&self, body: BlockBody) -> Block {
        match self.tip() {
            Some(tip) => Block::new(tip.id + 1, tip.hash, body),
            None => Block::new(1, Hash256::zero(), body),
        }
    }

    /// Find a transaction by id anywhere on the chain
    pub fn find_transaction(&self, id: &Hash256) -> Option<&Transaction> {
        self.transactions().find(|tx| tx.id() == *id)
    }

    /// Find a registered contract by id
    pub fn find_contract(&self, id: &Hash256) -> Option<&Contract> {
        self.blocks
            .iter()
            .flat_map(|block| block.body.contracts.iter())
            .find(|contract| contract.id() == *id)
    }

    /// All registered contracts in chain order
    pub fn list_contracts(&self) -> Vec<&Contract> {
        self.blocks
            .iter()
            .flat_map(|block| block.body.contracts.iter())
            .collect()
    }

    /// Find the transaction spending output `v_out` of `tx_id`, if any
    pub fn find_transaction_input(&self, tx_id: &Hash256, v_out: u32) -> Option<&Transaction> {
        self.transactions().find(|tx| {
            tx.inputs
                .iter()
                .any(|input| input.tx_id == *tx_id && input.v_out == v_out)
        })
    }

    /// First transaction referencing any output of `tx_id`
    pub fn find_referencing_transaction(&self, tx_id: &Hash256) -> Option<&Transaction> {
        self.transactions()
            .find(|tx| tx.inputs.iter().any(|input| input.tx_id == *tx_id))
    }

    /// All transactions paying the given public key or contract address
    pub fn find_transactions_to(&self, pub_key: &[u8]) -> Vec<&Transaction> {
        self.transactions()
            .filter(|tx| tx.outputs.iter().any(|output| output.pub_key == pub_key))
            .collect()
    }

    /// Outputs paying `pub_key` that no input references yet
    pub fn unspent_outputs(&self, pub_key: &[u8]) -> Vec<UnspentOutput> {
        let mut unspent = Vec::new();
        for tx in self.transactions() {
            let tx_id = tx.id();
            for (v_out, output) in tx.outputs.iter().enumerate() {
                if output.pub_key != pub_key {
                    continue;
                }
                let v_out = v_out as u32;
                if self.find_transaction_input(&tx_id, v_out).is_none() {
                    unspent.push(UnspentOutput { tx_id, v_out, amount: output.amount });
                }
            }
        }
        unspent
    }

    /// The contract a transaction invokes: exactly one input, at least one
    /// output, and the first output pays a known 32-byte contract address
    pub fn invoked_contract(&self, tx: &Transaction) -> Option<&Contract> {
        if tx.inputs.len() != 1 || tx.outputs.is_empty() {
            return None;
        }
        let address = Hash256::from_slice(&tx.outputs[0].pub_key).ok()?;
        self.find_contract(&address)
    }

    fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.blocks
            .iter()
            .flat_map(|block| block.body.transactions.iter())
    }
}

/// Shared chain state. Writers validate and append under the same guard,
/// so a candidate can never race another append.
#[derive(Debug, Default)]
pub struct Ledger {
    chain: RwLock<Chain>,
}

impl Ledger {
    pub fn new(chain: Chain) -> Self {
        Self { chain: RwLock::new(chain) }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Chain> {
        self.chain.read().expect("ledger lock poisoned")
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Chain> {
        self.chain.write().expect("ledger lock poisoned")
    }

    /// An owned copy of the current chain
    pub fn snapshot(&self) -> Chain {
        self.read().clone()
    }
}

// Whole-chain validation

use thiserror::Error;

use crate::chain::Chain;
use crate::consensus::verify::{TxVerifyError, verify_coinbase, verify_transaction};
use crate::contract;
use crate::core::{Hash256, Transaction};

/// Validation failure, pinned to the offending block
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("block #{block_id}: {kind}")]
pub struct ChainValidationError {
    pub block_id: u64,
    pub kind: ChainErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainErrorKind {
    #[error("genesis header hash does not match")]
    GenesisInvalidHeader,
    #[error("header hash does not match")]
    InvalidHeader,
    #[error("block id is not sequential")]
    InvalidId,
    #[error("previous hash does not link to the prior block")]
    InvalidPrevHash,
    #[error("block timestamp is not after its predecessor")]
    InvalidTimestampOrder,
    #[error("invalid transaction: {0}")]
    InvalidTransaction(TxVerifyError),
    #[error("transaction timestamps are not strictly increasing")]
    InvalidTransactionTimestampOrder,
    #[error("contract produced a transaction the block does not carry")]
    InvalidContractResult,
    #[error("contract-formatted transaction without a producing invocation")]
    InvalidContractTransactions,
}

/// Validate a whole chain, including every candidate produced by appending
/// or replacing blocks. The empty chain is valid and the genesis block gets
/// a header-only check. Standard transactions are verified against the full
/// chain; contract invocations are replayed against the chain as it was
/// before their block, and their outputs must match the contract-formatted
/// transactions the block carries, one for one. Failing invocations are
/// simply ignored.
pub fn validate_chain(chain: &Chain, block_reward: u64) -> Result<(), ChainValidationError> {
    let blocks = chain.blocks();

    for (index, block) in blocks.iter().enumerate() {
        let fail = |kind| Err(ChainValidationError { block_id: block.id, kind });

        if index == 0 {
            if !block.is_header_valid() {
                return fail(ChainErrorKind::GenesisInvalidHeader);
            }
            continue;
        }

        if !block.is_header_valid() {
            return fail(ChainErrorKind::InvalidHeader);
        }
        let prev = &blocks[index - 1];
        if prev.id + 1 != block.id {
            return fail(ChainErrorKind::InvalidId);
        }
        if prev.hash != block.prev_hash {
            return fail(ChainErrorKind::InvalidPrevHash);
        }
        if prev.timestamp >= block.timestamp {
            return fail(ChainErrorKind::InvalidTimestampOrder);
        }

        // Partition the body: contract invocations replay through the
        // interpreter, contract-formatted transactions must be accounted
        // for by an invocation, the rest verify positionally.
        let mut standard: Vec<&Transaction> = Vec::new();
        let mut invoking: Vec<&Transaction> = Vec::new();
        let mut generated_ids: Vec<Hash256> = Vec::new();
        for tx in &block.body.transactions {
            if chain.invoked_contract(tx).is_some() {
                invoking.push(tx);
            } else if tx.is_contract_formatted() {
                generated_ids.push(tx.id());
            } else {
                standard.push(tx);
            }
        }

        for (position, tx) in standard.iter().enumerate() {
            let result = if position == 0 {
                verify_coinbase(tx, block_reward)
            } else {
                verify_transaction(chain, tx, false)
            };
            if let Err(tx_error) = result {
                return fail(ChainErrorKind::InvalidTransaction(tx_error));
            }

            if position >= 2 && standard[position - 1].timestamp >= tx.timestamp {
                return fail(ChainErrorKind::InvalidTransactionTimestampOrder);
            }
        }

        if !invoking.is_empty() || !generated_ids.is_empty() {
            let prefix = chain.sub_chain(index);
            for tx in invoking {
                let Some(invoked) = chain.invoked_contract(tx) else {
                    continue;
                };
                match contract::run(&prefix, invoked, tx) {
                    Ok(produced) => {
                        for produced_tx in produced {
                            let produced_id = produced_tx.id();
                            match generated_ids.iter().position(|id| *id == produced_id) {
                                Some(slot) => {
                                    generated_ids.swap_remove(slot);
                                }
                                None => return fail(ChainErrorKind::InvalidContractResult),
                            }
                        }
                    }
                    // A failing invocation contributes nothing
                    Err(error) => {
                        log::debug!(
                            "contract invocation in block #{} failed during validation: {}",
                            block.id,
                            error
                        );
                    }
                }
            }

            if !generated_ids.is_empty() {
                return fail(ChainErrorKind::InvalidContractTransactions);
            }
        }
    }

    Ok(())
}

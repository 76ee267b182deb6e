// Transaction verification

use thiserror::Error;

use crate::chain::Chain;
use crate::core::{Hash256, Transaction};
use crate::wallet::RsaKeys;

/// Why a transaction was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TxVerifyError {
    #[error("coinbase must have exactly one input")]
    CoinbaseInvalidInputCount,
    #[error("coinbase input must reference the zero transaction id")]
    CoinbaseInvalidTxId,
    #[error("coinbase input must reference output 0")]
    CoinbaseInvalidVOut,
    #[error("coinbase must have exactly one output")]
    CoinbaseInvalidOutputCount,
    #[error("coinbase output must pay the block reward")]
    CoinbaseInvalidReward,
    #[error("coinbase output public key does not parse")]
    InvalidOutputPubKey,
    #[error("transaction has no inputs")]
    InvalidInputCount,
    #[error("transaction has no outputs")]
    InvalidOutputCount,
    #[error("input references an unknown transaction")]
    InvalidInputTxId,
    #[error("input references an output that does not exist")]
    InvalidInputVOut,
    #[error("input references an already spent output")]
    InvalidAlreadySpent,
    #[error("referenced output public key does not parse")]
    InvalidTargetOutputPubKey,
    #[error("input signature has the wrong length")]
    InvalidInputSignatureFormat,
    #[error("input signature does not verify")]
    InvalidInputSignature,
    #[error("input and output sums differ")]
    InvalidInputOutputSum,
}

/// Verify a coinbase transaction: zero-id input, single output paying the
/// block reward to a parseable key. The input signature bytes are free-form.
pub fn verify_coinbase(tx: &Transaction, block_reward: u64) -> Result<(), TxVerifyError> {
    if tx.inputs.len() != 1 {
        return Err(TxVerifyError::CoinbaseInvalidInputCount);
    }
    let input = &tx.inputs[0];
    if input.tx_id != Hash256::zero() {
        return Err(TxVerifyError::CoinbaseInvalidTxId);
    }
    if input.v_out != 0 {
        return Err(TxVerifyError::CoinbaseInvalidVOut);
    }
    if tx.outputs.len() != 1 {
        return Err(TxVerifyError::CoinbaseInvalidOutputCount);
    }
    let output = &tx.outputs[0];
    if output.amount != block_reward {
        return Err(TxVerifyError::CoinbaseInvalidReward);
    }
    if RsaKeys::public_only(&output.pub_key).is_err() {
        return Err(TxVerifyError::InvalidOutputPubKey);
    }
    Ok(())
}

/// Verify a standard transaction against the chain. Each input must
/// reference an existing output and carry a valid signature of the unsigned
/// transaction bytes under that output's key; input and output sums must
/// match. With `reject_if_spent` an input referencing an output some chain
/// transaction already spends is refused; chain validation passes `false`
/// since the spending transaction itself is already on the chain.
/// Output keys are not parsed: contract addresses are not valid keys.
pub fn verify_transaction(
    chain: &Chain,
    tx: &Transaction,
    reject_if_spent: bool,
) -> Result<(), TxVerifyError> {
    if tx.inputs.is_empty() {
        return Err(TxVerifyError::InvalidInputCount);
    }

    let unsigned_bytes = tx.to_unsigned().to_bytes();
    let mut input_sum: u64 = 0;
    for input in &tx.inputs {
        let target_tx = chain
            .find_transaction(&input.tx_id)
            .ok_or(TxVerifyError::InvalidInputTxId)?;
        let target_output = target_tx
            .outputs
            .get(input.v_out as usize)
            .ok_or(TxVerifyError::InvalidInputVOut)?;

        if reject_if_spent && chain.find_transaction_input(&input.tx_id, input.v_out).is_some() {
            return Err(TxVerifyError::InvalidAlreadySpent);
        }

        let key = RsaKeys::public_only(&target_output.pub_key)
            .map_err(|_| TxVerifyError::InvalidTargetOutputPubKey)?;
        if input.signature.len() != key.signature_len() {
            return Err(TxVerifyError::InvalidInputSignatureFormat);
        }
        if !key.verify(&unsigned_bytes, &input.signature) {
            return Err(TxVerifyError::InvalidInputSignature);
        }

        input_sum += target_output.amount;
    }

    if tx.outputs.is_empty() {
        return Err(TxVerifyError::InvalidOutputCount);
    }
    if input_sum != tx.output_sum() {
        return Err(TxVerifyError::InvalidInputOutputSum);
    }

    Ok(())
}

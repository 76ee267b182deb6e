// Crowdfunding escrow interpreter

use thiserror::Error;

use crate::chain::Chain;
use crate::core::{Contract, Hash256, Output, SignedInput, Transaction};

/// Why a contract invocation produced no transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("project is still running")]
    ProjectRunning,
    #[error("project reached its goal, only the owner can withdraw")]
    ProjectSuccessOwnerOnly,
    #[error("sender never invested in this project")]
    NotAnInvestor,
    #[error("funds were already withdrawn")]
    AlreadyWithdrawn,
    #[error("input reference could not be resolved")]
    ReferenceNotFound,
}

/// Run a contract against an invoking transaction. `chain` is the state
/// strictly before the block carrying `tx`. The first output of `tx` pays
/// the contract address; its amount selects the operation: a positive
/// amount is a deposit, zero asks for a withdrawal. Returns the
/// transactions the contract issues in response, if any.
pub fn run(chain: &Chain, contract: &Contract, tx: &Transaction) -> Result<Vec<Transaction>, ContractError> {
    let invoking_output = tx.outputs.first().ok_or(ContractError::ReferenceNotFound)?;

    if invoking_output.amount == 0 {
        withdraw(chain, contract, tx)
    } else {
        deposit(chain, contract, tx)
    }
}

/// Deposits are a no-op while the project runs. After the deadline the
/// money bounces straight back to the sender.
fn deposit(chain: &Chain, contract: &Contract, tx: &Transaction) -> Result<Vec<Transaction>, ContractError> {
    if tx.timestamp <= contract.deadline {
        return Ok(Vec::new());
    }

    let sender = find_sending_pub_key(chain, tx)?;
    let refund = Transaction::new(
        0,
        vec![SignedInput::new(tx.id(), 0, Vec::new())],
        vec![Output::new(tx.outputs[0].amount, sender)],
    );
    Ok(vec![refund])
}

fn withdraw(chain: &Chain, contract: &Contract, tx: &Transaction) -> Result<Vec<Transaction>, ContractError> {
    if tx.timestamp <= contract.deadline {
        return Err(ContractError::ProjectRunning);
    }

    let address = contract.id();

    // Everything paid to the contract before the deadline counts
    let mut investments = chain.find_transactions_to(address.as_bytes());
    investments.retain(|investment| investment.timestamp <= contract.deadline);

    let investment_sum: u64 = investments
        .iter()
        .map(|investment| {
            investment
                .outputs
                .iter()
                .filter(|output| output.pub_key == address.as_bytes())
                .map(|output| output.amount)
                .sum::<u64>()
        })
        .sum();

    let sender = find_sending_pub_key(chain, tx)?;

    // The sender's own investments, and whether they were refunded already
    let mut incoming = Vec::new();
    for investment in &investments {
        if find_sending_pub_key(chain, investment)? == sender {
            incoming.push(*investment);
        }
    }
    let already_refunded = incoming
        .iter()
        .any(|investment| chain.find_referencing_transaction(&investment.id()).is_some());

    if investment_sum >= contract.goal {
        // Funded project: the owner collects everything in one payout
        if sender != contract.owner_pub_key {
            return Err(ContractError::ProjectSuccessOwnerOnly);
        }
        if find_owner_payout(chain, &address, &sender, investment_sum).is_some() {
            return Err(ContractError::AlreadyWithdrawn);
        }

        let inputs = investments
            .iter()
            .map(|investment| SignedInput::new(investment.id(), 0, Vec::new()))
            .collect();
        let payout = Transaction::new(0, inputs, vec![Output::new(investment_sum, sender)]);
        Ok(vec![payout])
    } else {
        // Failed project: each investor reclaims their own deposits
        if incoming.is_empty() {
            return Err(ContractError::NotAnInvestor);
        }
        if already_refunded {
            return Err(ContractError::AlreadyWithdrawn);
        }

        let mut inputs = Vec::new();
        let mut refund_sum = 0;
        for investment in &incoming {
            inputs.push(SignedInput::new(investment.id(), 0, Vec::new()));
            refund_sum += investment.outputs.first().map_or(0, |output| output.amount);
        }
        let refund = Transaction::new(0, inputs, vec![Output::new(refund_sum, sender)]);
        Ok(vec![refund])
    }
}

/// The public key behind a transaction: the key of the output its first
/// input references
pub fn find_sending_pub_key(chain: &Chain, tx: &Transaction) -> Result<Vec<u8>, ContractError> {
    let input = tx.inputs.first().ok_or(ContractError::ReferenceNotFound)?;
    let referenced = chain
        .find_transaction(&input.tx_id)
        .ok_or(ContractError::ReferenceNotFound)?;
    let output = referenced
        .outputs
        .get(input.v_out as usize)
        .ok_or(ContractError::ReferenceNotFound)?;
    Ok(output.pub_key.clone())
}

/// A previous payout of the full investment sum to the owner: zero
/// timestamp, a single output of exactly the sum, and every input drawing
/// from an output paid to the contract
fn find_owner_payout<'a>(
    chain: &'a Chain,
    address: &Hash256,
    owner: &[u8],
    investment_sum: u64,
) -> Option<&'a Transaction> {
    chain
        .find_transactions_to(owner)
        .into_iter()
        .filter(|tx| tx.timestamp == 0 && tx.outputs.len() == 1)
        .find(|tx| {
            let from_contract = tx.inputs.iter().all(|input| {
                chain
                    .find_transaction(&input.tx_id)
                    .and_then(|referenced| referenced.outputs.get(input.v_out as usize))
                    .is_some_and(|output| output.pub_key == address.as_bytes())
            });
            from_contract && tx.outputs[0].amount == investment_sum
        })
}

// Wallet transaction builders

use thiserror::Error;

use crate::chain::Chain;
use crate::core::{
    Contract, Hash256, Input, Output, Transaction, UnsignedContract, UnsignedTransaction,
    UnspentOutput,
};
use crate::wallet::keys::{KeyError, RsaKeys};

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("not enough funds: {available} available, {needed} needed")]
    InsufficientFunds { available: u64, needed: u64 },
    #[error("no single output large enough for an escrow payment of {needed}")]
    NoSuitableOutput { needed: u64 },
    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Builds and signs transactions against the owner's unspent outputs.
/// Escrow payments keep to one input and a contract-first output list,
/// the shape the interpreter expects.
pub struct Wallet {
    keys: RsaKeys,
}

impl Wallet {
    pub fn new(keys: RsaKeys) -> Self {
        Self { keys }
    }

    pub fn keys(&self) -> &RsaKeys {
        &self.keys
    }

    pub fn balance(&self, chain: &Chain) -> u64 {
        chain
            .unspent_outputs(self.keys.public_der())
            .iter()
            .map(|utxo| utxo.amount)
            .sum()
    }

    /// Pay `amount` to a public key, gathering as many own outputs as
    /// needed and returning the change to the own key
    pub fn build_payment(
        &self,
        chain: &Chain,
        recipient: &[u8],
        amount: u64,
        timestamp: i64,
    ) -> Result<Transaction, WalletError> {
        let utxos = chain.unspent_outputs(self.keys.public_der());
        let available: u64 = utxos.iter().map(|utxo| utxo.amount).sum();
        if available < amount {
            return Err(WalletError::InsufficientFunds { available, needed: amount });
        }

        let mut selected = Vec::new();
        let mut gathered = 0;
        for utxo in utxos {
            selected.push(utxo);
            gathered += utxo.amount;
            if gathered >= amount {
                break;
            }
        }

        let mut outputs = vec![Output::new(amount, recipient.to_vec())];
        if gathered > amount {
            outputs.push(Output::new(gathered - amount, self.keys.public_der().to_vec()));
        }
        self.sign_spend(selected, outputs, timestamp)
    }

    /// Invest in a contract: a single input paying the contract address at
    /// output 0, change behind it
    pub fn build_investment(
        &self,
        chain: &Chain,
        contract_id: &Hash256,
        amount: u64,
        timestamp: i64,
    ) -> Result<Transaction, WalletError> {
        let utxo = self.single_output_covering(chain, amount)?;

        let mut outputs = vec![Output::new(amount, contract_id.as_bytes().to_vec())];
        if utxo.amount > amount {
            outputs.push(Output::new(utxo.amount - amount, self.keys.public_der().to_vec()));
        }
        self.sign_spend(vec![utxo], outputs, timestamp)
    }

    /// Ask a contract to pay out: a zero-amount output to the contract
    /// address, with the consumed output returned to the own key so the
    /// sums stay balanced
    pub fn build_withdrawal(
        &self,
        chain: &Chain,
        contract_id: &Hash256,
        timestamp: i64,
    ) -> Result<Transaction, WalletError> {
        let utxo = self.single_output_covering(chain, 0)?;

        let outputs = vec![
            Output::new(0, contract_id.as_bytes().to_vec()),
            Output::new(utxo.amount, self.keys.public_der().to_vec()),
        ];
        self.sign_spend(vec![utxo], outputs, timestamp)
    }

    /// Create and sign a contract owned by this wallet
    pub fn build_contract(
        &self,
        title: String,
        description: String,
        goal: u64,
        deadline: i64,
        timestamp: i64,
    ) -> Result<Contract, WalletError> {
        let unsigned = UnsignedContract {
            timestamp,
            deadline,
            goal,
            owner_pub_key: self.keys.public_der().to_vec(),
            title,
            description,
        };
        let signature = self.keys.sign(&unsigned.to_bytes())?;
        Ok(unsigned.into_signed(signature))
    }

    fn single_output_covering(&self, chain: &Chain, amount: u64) -> Result<UnspentOutput, WalletError> {
        let utxos = chain.unspent_outputs(self.keys.public_der());
        utxos
            .into_iter()
            .filter(|utxo| utxo.amount >= amount)
            .min_by_key(|utxo| utxo.amount)
            .ok_or(WalletError::NoSuitableOutput { needed: amount })
    }

    fn sign_spend(
        &self,
        utxos: Vec<UnspentOutput>,
        outputs: Vec<Output>,
        timestamp: i64,
    ) -> Result<Transaction, WalletError> {
        let inputs = utxos
            .iter()
            .map(|utxo| Input { tx_id: utxo.tx_id, v_out: utxo.v_out })
            .collect();
        let unsigned = UnsignedTransaction::new(timestamp, inputs, outputs);
        let message = unsigned.to_bytes();
        let mut signatures = Vec::with_capacity(utxos.len());
        for _ in &utxos {
            signatures.push(self.keys.sign(&message)?);
        }
        Ok(unsigned.into_signed(signatures))
    }
}

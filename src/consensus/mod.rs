// Consensus rules: proof of work, transaction and chain validation

pub mod chain;
pub mod miner;
pub mod verify;

pub use chain::{ChainErrorKind, ChainValidationError, validate_chain};
pub use miner::{MineOutcome, Miner, count_leading_zero_bits};
pub use verify::{TxVerifyError, verify_coinbase, verify_transaction};

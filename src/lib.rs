// Crowdchain: a proof-of-work blockchain hosting crowdfunding escrow contracts

pub mod chain;
pub mod config;
pub mod consensus;
pub mod contract;
pub mod core;
pub mod network;
pub mod node;
pub mod wallet;

// Re-exports for convenience
pub use chain::{Chain, Ledger};
pub use config::Config;
pub use consensus::{Miner, validate_chain, verify_transaction};
pub use crate::core::{Block, BlockBody, Contract, Hash256, HashedBlock, Transaction};
pub use network::{Message, Network, NullNetwork};
pub use node::{MinerSettings, Node};
pub use wallet::{RsaKeys, Wallet};

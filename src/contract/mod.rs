// Crowdfunding escrow contract interpreter

pub mod vm;

pub use vm::{ContractError, run};

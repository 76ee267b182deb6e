// Chain state

pub mod ledger;

pub use ledger::{Chain, ChainFileError, Ledger};

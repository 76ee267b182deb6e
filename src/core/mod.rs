// Core data structures and canonical encoding

pub mod block;
pub mod contract;
pub mod encode;
pub mod hash;
pub mod transaction;
pub mod types;

pub use block::{Block, BlockBody, HashedBlock};
pub use contract::{Contract, UnsignedContract};
pub use hash::sha256;
pub use transaction::{Input, Output, SignedInput, Transaction, UnsignedTransaction, UnspentOutput};
pub use types::Hash256;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall clock in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}

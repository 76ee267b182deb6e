// Keys and wallet-side transaction building

pub mod builder;
pub mod keys;

pub use builder::{Wallet, WalletError};
pub use keys::{KeyError, RsaKeys};

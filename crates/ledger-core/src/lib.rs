//! Single-node proof-of-work ledger: signed transfers batched into
//! hash-linked blocks, balances derived by replaying the chain.

pub mod block;
pub mod chain;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod store;
pub mod transaction;
pub mod wallet;

use std::time::{SystemTime, UNIX_EPOCH};

pub use block::Block;
pub use chain::{Admission, Ledger};
pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use store::{BlockStore, MemoryStore};
pub use transaction::Transaction;
pub use wallet::Wallet;

pub type Hash = [u8; 32];

/// Milliseconds since the UNIX epoch; zero if the clock reads before it.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

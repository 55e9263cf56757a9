use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid signature for transaction {0}")]
    InvalidSignature(String),

    #[error("insufficient balance: {address} holds {balance}, transfer needs {required}")]
    InsufficientBalance {
        address: String,
        balance: i128,
        required: u64,
    },

    #[error("invalid address {0:?}: expected 64 lowercase hex characters")]
    InvalidAddress(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("mined block {hash} does not satisfy difficulty {difficulty}")]
    BlockInvalid { hash: String, difficulty: usize },

    #[error("storage failure: {0}")]
    StorageFailure(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

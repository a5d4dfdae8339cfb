use crate::crypto::hash::Hash256;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Malformed block: {0}")]
    MalformedBlock(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Blockchain already exists")]
    AlreadyInitialized,

    #[error("No blockchain found, create one first")]
    NotInitialized,

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Value overflow: {0}")]
    ValueOverflow(String),

    #[error("Block not found: {0}")]
    BlockNotFound(Hash256),

    #[error("Mining error: {0}")]
    Mining(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sled::Error> for LedgerError {
    fn from(err: sled::Error) -> Self {
        LedgerError::StoreUnavailable(err.to_string())
    }
}

impl LedgerError {
    /// Process exit code reported by the command-line front-end.
    pub fn exit_code(&self) -> i32 {
        match self {
            LedgerError::MalformedBlock(_) => 10,
            LedgerError::StoreUnavailable(_) => 11,
            LedgerError::AlreadyInitialized => 12,
            LedgerError::NotInitialized => 13,
            LedgerError::InsufficientFunds { .. } => 14,
            LedgerError::BlockNotFound(_) => 15,
            LedgerError::ValueOverflow(_) => 19,
            LedgerError::Mining(_) => 16,
            LedgerError::Config(_) => 17,
            LedgerError::Wallet(_) | LedgerError::Crypto(_) => 18,
            LedgerError::InvalidInput(_) => 2,
            LedgerError::Serialization(_) | LedgerError::Io(_) => 1,
        }
    }
}

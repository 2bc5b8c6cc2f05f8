//! Error types for folio client operations
//!
//! Remote failures are split by direction: reads surface as `Fetch`,
//! writes as `Submit`. Nothing in the client retries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FolioError {
    #[error("No wallet provider available. Please install a wallet to connect.")]
    ProviderUnavailable,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Submit error: {0}")]
    Submit(String),

    #[error("Wallet not connected")]
    NotConnected,

    #[error("Another wallet operation is already in progress")]
    OperationPending,

    #[error("Game not found: {0}")]
    GameNotFound(String),

    #[error("Wallet provider error: {0}")]
    Provider(String),

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FolioError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn fetch(err: impl std::fmt::Display) -> Self {
        Self::Fetch(err.to_string())
    }

    pub fn submit(err: impl std::fmt::Display) -> Self {
        Self::Submit(err.to_string())
    }

    pub fn provider(err: impl std::fmt::Display) -> Self {
        Self::Provider(err.to_string())
    }

    pub fn contract(err: impl std::fmt::Display) -> Self {
        Self::Contract(err.to_string())
    }
}

//! # Errors
//!
//! This module defines the errors for the blockchain module

use thiserror::Error;

/// Blockchain result type
pub type BlockchainResult<T> = Result<T, BlockchainError>;

#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("malformed block: {0}")]
    MalformedBlock(String),
    #[error("block #{0} is not linked to its predecessor")]
    ChainLinkageInvalid(u32),
    #[error("block #{0} not found")]
    BlockNotFound(u32),
    #[error("no valid nonce found at difficulty {0}")]
    NoValidNonce(u32),
    #[error("mining was cancelled")]
    MiningCancelled,
    #[error("a block is already being mined")]
    MiningInProgress,
    #[error("io error: {0}")]
    Io(std::io::Error),
    #[error("block has a bad json value: {0}")]
    Json(serde_json::Error),
}

impl BlockchainError {
    /// Construct a `MalformedBlock` error
    pub(crate) fn malformed(reason: impl ToString) -> Self {
        Self::MalformedBlock(reason.to_string())
    }

    /// Returns whether the operation may succeed if retried with different inputs
    /// (e.g. a new timestamp or a lower difficulty)
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NoValidNonce(_) | Self::MiningCancelled)
    }
}

impl From<std::io::Error> for BlockchainError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for BlockchainError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

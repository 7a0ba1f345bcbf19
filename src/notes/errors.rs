//! # Errors
//!
//! Note error types

use crate::bridge::content_store::{ContentId, ContentStoreError};

use std::string::FromUtf8Error;
use thiserror::Error;

/// Result returned by note operations
pub type NoteResult<T> = Result<T, NoteError>;

#[derive(Debug, Error)]
/// Describes a note error
pub enum NoteError {
    #[error("content store error: {0}")]
    ContentStore(ContentStoreError),
    #[error("bad note metadata: {0}")]
    Json(serde_json::Error),
    #[error("transaction payload is not a content id: {0}")]
    BadPayload(FromUtf8Error),
    #[error("note metadata {0} not found")]
    MetadataNotFound(ContentId),
    #[error("blockchain error: {0}")]
    Blockchain(crate::blockchain::BlockchainError),
}

impl From<ContentStoreError> for NoteError {
    fn from(e: ContentStoreError) -> Self {
        Self::ContentStore(e)
    }
}

impl From<serde_json::Error> for NoteError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<FromUtf8Error> for NoteError {
    fn from(e: FromUtf8Error) -> Self {
        Self::BadPayload(e)
    }
}

impl From<crate::blockchain::BlockchainError> for NoteError {
    fn from(e: crate::blockchain::BlockchainError) -> Self {
        Self::Blockchain(e)
    }
}

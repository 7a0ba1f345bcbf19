//! # Transaction
//!
//! the transaction contained in the block. The payload is opaque to the blockchain.

use crate::blockchain::{BlockchainError, BlockchainResult};

/// Maximum payload size; the length must fit the 4 bytes frame prefix
pub const MAX_TRANSACTION_SIZE: usize = u32::MAX as usize;

/// An opaque binary payload recorded in a block
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Transaction {
    payload: Vec<u8>,
}

impl Transaction {
    /// Instantiates a new `Transaction`
    pub fn new(payload: impl Into<Vec<u8>>) -> BlockchainResult<Self> {
        let payload = payload.into();
        if payload.len() > MAX_TRANSACTION_SIZE {
            return Err(BlockchainError::malformed(format!(
                "transaction payload is too big ({} bytes)",
                payload.len()
            )));
        }
        Ok(Self { payload })
    }

    /// Get transaction payload
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length in bytes
    pub fn byte_len(&self) -> usize {
        self.payload.len()
    }

    /// Take the payload out of the transaction
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

impl TryFrom<Vec<u8>> for Transaction {
    type Error = BlockchainError;

    fn try_from(payload: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(payload)
    }
}

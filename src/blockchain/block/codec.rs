//! # Codec
//!
//! Binary form of a block: `header (84 bytes) ‖ body`, where the body is a sequence of
//! `[u32 big-endian length][payload]` frames, one per transaction, in list order.

use super::{Block, Hash256, Header, Transaction, HEADER_SIZE};
use crate::blockchain::{BlockchainError, BlockchainResult};

/// Size of the length prefix of each transaction frame
const FRAME_PREFIX_SIZE: usize = 4;

impl Block {
    /// Encode block into its canonical byte form
    pub fn encode(&self) -> Vec<u8> {
        let body = encode_body(&self.transactions);
        let mut bytes = Vec::with_capacity(HEADER_SIZE + body.len());
        bytes.extend_from_slice(self.header.as_bytes());
        bytes.extend_from_slice(&body);
        bytes
    }

    /// Decode block from its byte form.
    ///
    /// Fails if the buffer is shorter than the header, if the body frames don't add up to the
    /// body length, or if the header `txhash` doesn't commit to the body
    pub fn decode(bytes: &[u8]) -> BlockchainResult<Self> {
        let header = Header::from_slice(bytes).ok_or_else(|| {
            BlockchainError::malformed(format!(
                "buffer is {} bytes long; header requires {}",
                bytes.len(),
                HEADER_SIZE
            ))
        })?;
        let body = &bytes[HEADER_SIZE..];
        let transactions = decode_body(body)?;
        if Hash256::digest(body) != header.txhash() {
            return Err(BlockchainError::malformed(format!(
                "txhash of block #{} doesn't match its body",
                header.number()
            )));
        }
        Ok(Self {
            header,
            transactions,
        })
    }
}

/// Concatenate the length-prefixed transactions
pub fn encode_body(transactions: &[Transaction]) -> Vec<u8> {
    let size = transactions
        .iter()
        .map(|x| FRAME_PREFIX_SIZE + x.byte_len())
        .sum::<usize>();
    let mut body = Vec::with_capacity(size);
    for transaction in transactions {
        // payload length is bounded by `MAX_TRANSACTION_SIZE`
        body.extend_from_slice(&(transaction.byte_len() as u32).to_be_bytes());
        body.extend_from_slice(transaction.payload());
    }
    body
}

/// Split an encoded body back into its transactions
pub fn decode_body(mut body: &[u8]) -> BlockchainResult<Vec<Transaction>> {
    let mut transactions = Vec::new();
    while !body.is_empty() {
        if body.len() < FRAME_PREFIX_SIZE {
            return Err(BlockchainError::malformed(format!(
                "truncated length prefix ({} bytes left)",
                body.len()
            )));
        }
        let (prefix, rest) = body.split_at(FRAME_PREFIX_SIZE);
        let mut len = [0; FRAME_PREFIX_SIZE];
        len.copy_from_slice(prefix);
        let len = u32::from_be_bytes(len) as usize;
        if rest.len() < len {
            return Err(BlockchainError::malformed(format!(
                "transaction declares {} bytes but only {} are left",
                len,
                rest.len()
            )));
        }
        let (payload, rest) = rest.split_at(len);
        transactions.push(Transaction::new(payload)?);
        body = rest;
    }
    Ok(transactions)
}

/// Calculate the digest of the transactions; sha256 over the encoded body
pub fn recompute_txhash(transactions: &[Transaction]) -> Hash256 {
    Hash256::digest(&encode_body(transactions))
}

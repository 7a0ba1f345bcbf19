//! # Block
//!
//! block module exposes the Block type and the block components

mod codec;
mod hash;
mod header;
mod json;
mod transaction;

pub use codec::{decode_body, encode_body, recompute_txhash};
pub use hash::{Hash256, HASH_SIZE};
pub use header::{Header, HEADER_SIZE};
pub use transaction::{Transaction, MAX_TRANSACTION_SIZE};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current block format version
pub const BLOCK_VERSION: u32 = 1;

/// A block of the chain: the 84 bytes header followed by the ordered transactions.
///
/// The header `txhash` is kept in sync with `transactions`: every method which changes the
/// transactions list recomputes it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Block {
    header: Header,
    transactions: Vec<Transaction>,
}

impl Block {
    /// Instantiates a new `Block`
    pub fn new(number: u32, prevhash: Hash256, time: f64, transactions: Vec<Transaction>) -> Self {
        let mut header = Header::default();
        header.set_number(number);
        header.set_prevhash(&prevhash);
        header.set_version(BLOCK_VERSION);
        header.set_time(time);
        let mut block = Self {
            header,
            transactions: Vec::new(),
        };
        block.set_transactions(transactions);
        block
    }

    /// Generate the genesis block, created at the current time
    pub fn genesis() -> Self {
        Self::new(0, Hash256::ZERO, now_millis(), Vec::new())
    }

    /// Return block number
    pub fn number(&self) -> u32 {
        self.header.number()
    }

    /// Return hash of the previous block
    pub fn prevhash(&self) -> Hash256 {
        self.header.prevhash()
    }

    /// Return block format version
    pub fn version(&self) -> u32 {
        self.header.version()
    }

    /// Return the creation time in milliseconds since UNIX epoch
    pub fn time(&self) -> f64 {
        self.header.time()
    }

    /// Return the digest of the encoded transactions
    pub fn txhash(&self) -> Hash256 {
        self.header.txhash()
    }

    /// Return the proof-of-work nonce
    pub fn nonce(&self) -> u32 {
        self.header.nonce()
    }

    /// Set nonce. Changes the block hash
    pub fn set_nonce(&mut self, nonce: u32) {
        self.header.set_nonce(nonce);
    }

    /// Return a reference to the block header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Return the block transactions
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Replace the block transactions
    pub fn set_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
        self.update_txhash();
    }

    /// Append a transaction to the block
    pub fn push_transaction(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
        self.update_txhash();
    }

    /// Take the transactions out of the block
    pub fn into_transactions(self) -> Vec<Transaction> {
        self.transactions
    }

    /// Calculate the block hash (sha256 of the header)
    pub fn hash(&self) -> Hash256 {
        self.header.hash()
    }

    /// Verify the block against its predecessor.
    ///
    /// The genesis block is always valid; any other block is valid if it directly follows
    /// `prev` and its `prevhash` is the hash of `prev`.
    pub fn validate(&self, prev: Option<&Block>) -> bool {
        if self.number() == 0 {
            return true;
        }
        match prev {
            Some(prev) => {
                prev.number().checked_add(1) == Some(self.number())
                    && self.prevhash() == prev.hash()
            }
            None => false,
        }
    }

    fn update_txhash(&mut self) {
        let txhash = recompute_txhash(&self.transactions);
        self.header.set_txhash(&txhash);
    }
}

/// Current time as milliseconds since UNIX epoch
pub fn now_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|x| x.as_millis() as f64)
        .unwrap_or_default()
}

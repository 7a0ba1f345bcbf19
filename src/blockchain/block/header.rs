//! # Header
//!
//! block header. The header is a fixed 84 bytes buffer; every field lives at a fixed offset
//! and multi-byte numbers are stored big-endian.
//!
//! | field    | offset | length |
//! |----------|--------|--------|
//! | number   | 0      | 4      |
//! | prevhash | 4      | 32     |
//! | version  | 36     | 4      |
//! | time     | 40     | 8      |
//! | txhash   | 48     | 32     |
//! | nonce    | 80     | 4      |

use super::{Hash256, HASH_SIZE};

use std::fmt;

/// Size in bytes of an encoded header
pub const HEADER_SIZE: usize = 84;

const NUMBER_OFFSET: usize = 0;
const PREVHASH_OFFSET: usize = 4;
const VERSION_OFFSET: usize = 36;
const TIME_OFFSET: usize = 40;
const TXHASH_OFFSET: usize = 48;
const NONCE_OFFSET: usize = 80;

/// Blockchain header
#[derive(Clone, PartialEq, Eq)]
pub struct Header([u8; HEADER_SIZE]);

impl Default for Header {
    fn default() -> Self {
        Self([0; HEADER_SIZE])
    }
}

impl Header {
    /// Read header from the first `HEADER_SIZE` bytes of `bytes`
    pub(super) fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes
            .get(..HEADER_SIZE)
            .and_then(|x| <[u8; HEADER_SIZE]>::try_from(x).ok())
            .map(Self)
    }

    /// Get raw header bytes
    pub fn as_bytes(&self) -> &[u8; HEADER_SIZE] {
        &self.0
    }

    /// Calculate sha256 of header
    pub fn hash(&self) -> Hash256 {
        Hash256::digest(&self.0)
    }

    /// Block number
    pub fn number(&self) -> u32 {
        u32::from_be_bytes(self.field(NUMBER_OFFSET))
    }

    pub(super) fn set_number(&mut self, number: u32) {
        self.set_field(NUMBER_OFFSET, &number.to_be_bytes());
    }

    /// Hash of the previous block header
    pub fn prevhash(&self) -> Hash256 {
        Hash256::from(self.field::<HASH_SIZE>(PREVHASH_OFFSET))
    }

    pub(super) fn set_prevhash(&mut self, prevhash: &Hash256) {
        self.set_field(PREVHASH_OFFSET, prevhash.as_bytes());
    }

    /// Block format version
    pub fn version(&self) -> u32 {
        u32::from_be_bytes(self.field(VERSION_OFFSET))
    }

    pub(super) fn set_version(&mut self, version: u32) {
        self.set_field(VERSION_OFFSET, &version.to_be_bytes());
    }

    /// Milliseconds since UNIX epoch the block was created at
    pub fn time(&self) -> f64 {
        f64::from_be_bytes(self.field(TIME_OFFSET))
    }

    pub(super) fn set_time(&mut self, time: f64) {
        self.set_field(TIME_OFFSET, &time.to_be_bytes());
    }

    /// Digest of the encoded transactions
    pub fn txhash(&self) -> Hash256 {
        Hash256::from(self.field::<HASH_SIZE>(TXHASH_OFFSET))
    }

    pub(super) fn set_txhash(&mut self, txhash: &Hash256) {
        self.set_field(TXHASH_OFFSET, txhash.as_bytes());
    }

    /// Proof-of-work nonce
    pub fn nonce(&self) -> u32 {
        u32::from_be_bytes(self.field(NONCE_OFFSET))
    }

    pub(super) fn set_nonce(&mut self, nonce: u32) {
        self.set_field(NONCE_OFFSET, &nonce.to_be_bytes());
    }

    fn field<const N: usize>(&self, offset: usize) -> [u8; N] {
        let mut out = [0; N];
        out.copy_from_slice(&self.0[offset..offset + N]);
        out
    }

    fn set_field(&mut self, offset: usize, value: &[u8]) {
        self.0[offset..offset + value.len()].copy_from_slice(value);
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("number", &self.number())
            .field("prevhash", &self.prevhash().to_string())
            .field("version", &self.version())
            .field("time", &self.time())
            .field("txhash", &self.txhash().to_string())
            .field("nonce", &self.nonce())
            .finish()
    }
}

//! # Hash
//!
//! SHA-256 digest type used for block hashes and transaction digests

use data_encoding::BASE64;
use ring::digest::{digest, SHA256};
use std::fmt;

/// Size in bytes of a digest
pub const HASH_SIZE: usize = 32;

/// A 256 bit digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Hash256([u8; HASH_SIZE]);

impl Hash256 {
    /// All-zero digest, used as `prevhash` of the first block
    pub const ZERO: Self = Self([0; HASH_SIZE]);

    /// Calculate the sha256 of `data`
    pub fn digest(data: &[u8]) -> Self {
        let mut out = [0; HASH_SIZE];
        out.copy_from_slice(digest(&SHA256, data).as_ref());
        Self(out)
    }

    /// Try to build a digest from a slice; fails if the slice isn't exactly `HASH_SIZE` long
    pub fn from_slice(data: &[u8]) -> Option<Self> {
        <[u8; HASH_SIZE]>::try_from(data).ok().map(Self)
    }

    /// Get digest bytes
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Encode digest as base64
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.0)
    }

    /// Decode digest from base64
    pub fn from_base64(s: &str) -> Option<Self> {
        BASE64
            .decode(s.as_bytes())
            .ok()
            .and_then(|bytes| Self::from_slice(&bytes))
    }
}

impl From<[u8; HASH_SIZE]> for Hash256 {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn should_calc_sha256() {
        assert_eq!(
            Hash256::digest(b"").to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn should_encode_and_decode_base64() {
        let hash = Hash256::digest(b"cafebabe");
        assert_eq!(Hash256::from_base64(&hash.to_base64()).unwrap(), hash);
        // 3 bytes only
        assert!(Hash256::from_base64("AAAA").is_none());
        assert!(Hash256::from_base64("not base64!").is_none());
    }

    #[test]
    fn should_reject_slice_with_bad_length() {
        assert!(Hash256::from_slice(&[0; 31]).is_none());
        assert_eq!(Hash256::from_slice(&[0; 32]).unwrap(), Hash256::ZERO);
    }
}

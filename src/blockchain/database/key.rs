//! # key
//!
//! This module implements the key of a block file in the chain directory

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

/// The key used for block files: the block number, written as a decimal string
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockKey(u32);

impl From<u32> for BlockKey {
    fn from(number: u32) -> Self {
        Self(number)
    }
}

impl BlockKey {
    /// Parse key from a file name; only plain decimal names are block files
    pub fn from_file_name(name: &OsStr) -> Option<Self> {
        let name = name.to_str()?;
        if name.is_empty() || !name.bytes().all(|x| x.is_ascii_digit()) {
            return None;
        }
        name.parse().ok().map(Self)
    }

    /// Get block number
    pub fn number(&self) -> u32 {
        self.0
    }

    /// Get path of the block file in `dir`
    pub fn path(&self, dir: &Path) -> PathBuf {
        dir.join(self.to_string())
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn should_use_block_number_as_file_name() {
        let key = BlockKey::from(42);
        assert_eq!(key.number(), 42);
        assert_eq!(key.path(Path::new("/tmp/chain")), Path::new("/tmp/chain/42"));
    }

    #[test]
    fn should_parse_key_from_file_name() {
        assert_eq!(
            BlockKey::from_file_name(OsStr::new("1024")).unwrap(),
            BlockKey::from(1024)
        );
        assert!(BlockKey::from_file_name(OsStr::new("")).is_none());
        assert!(BlockKey::from_file_name(OsStr::new(".tmp1234")).is_none());
        assert!(BlockKey::from_file_name(OsStr::new("+12")).is_none());
        assert!(BlockKey::from_file_name(OsStr::new("99999999999")).is_none());
    }
}

//! # Database
//!
//! Database to store the blocks of our blockchain.
//! Every block is stored in its own file, named after the block number, in the chain directory.

mod key;

use super::{Block, BlockchainError, BlockchainResult};
use key::BlockKey;

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Outcome of a chain verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    /// Number of the first block which could not be verified (missing, malformed or not linked).
    /// All the blocks before this one are verified.
    pub verified_up_to: u64,
    /// Whether verification reached the last block in the database
    pub fully_verified: bool,
}

/// Blockchain database client
#[derive(Debug)]
pub struct BlockchainDatabase {
    path: PathBuf,
    /// highest block number found in the directory
    last_number: Option<u32>,
    cache: HashMap<u32, Block>,
}

impl BlockchainDatabase {
    /// Open the database at `path` and find the highest block stored in it.
    /// The directory is created if it doesn't exist.
    ///
    /// Hash linkage is NOT checked here; see `verify`
    pub fn load(path: impl AsRef<Path>) -> BlockchainResult<Self> {
        let path = path.as_ref().to_path_buf();
        debug!("loading blockchain database at {}", path.display());
        if !path.exists() {
            info!(
                "blockchain directory {} doesn't exist; creating it",
                path.display()
            );
            fs::create_dir_all(&path)?;
        }
        let mut last_number = None;
        for entry in fs::read_dir(&path)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(key) = BlockKey::from_file_name(&entry.file_name()) {
                last_number = last_number.max(Some(key.number()));
            }
        }
        match last_number {
            Some(number) => info!("blocks loaded, last block: #{}", number),
            None => info!("no local blocks found"),
        }
        Ok(Self {
            path,
            last_number,
            cache: HashMap::new(),
        })
    }

    /// Get database directory path
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Highest block number stored in the database
    pub fn last_number(&self) -> Option<u32> {
        self.last_number
    }

    /// Verify chain linkage, starting from block `start`, up to the last stored block.
    ///
    /// Stops at the first block which is missing, can't be decoded or isn't linked to its
    /// predecessor. Blocks after the first failure are never checked.
    /// Blocks are always read from disk; the cache is refreshed with what has been read.
    pub fn verify(&mut self, start: u32) -> Verification {
        let last_number = match self.last_number {
            Some(n) => n as u64,
            None => {
                return Verification {
                    verified_up_to: start as u64,
                    fully_verified: true,
                }
            }
        };
        debug!("verifying blocks from #{} to #{}", start, last_number);
        // when starting mid-chain, check against the predecessor if we can read it
        let mut prev: Option<Block> = match start.checked_sub(1) {
            Some(n) => self.reload_block(n).ok(),
            None => None,
        };
        let mut number = start as u64;
        while number <= last_number {
            let block = match self.reload_block(number as u32) {
                Ok(block) => block,
                Err(err) => {
                    warn!("verification stopped at block #{}: {}", number, err);
                    break;
                }
            };
            if let Some(prev) = prev.as_ref() {
                if !block.validate(Some(prev)) {
                    warn!(
                        "verification stopped: {}",
                        BlockchainError::ChainLinkageInvalid(block.number())
                    );
                    break;
                }
            }
            prev = Some(block);
            number += 1;
        }
        let verification = Verification {
            verified_up_to: number,
            fully_verified: number > last_number,
        };
        debug!("verification result: {:?}", verification);
        verification
    }

    /// Get block from database with provided number.
    /// Decoded blocks are cached.
    pub fn get_block(&mut self, number: u32) -> BlockchainResult<&Block> {
        if !self.cache.contains_key(&number) {
            let block = self.read_block(number)?;
            self.cache.insert(number, block);
        }
        self.cache
            .get(&number)
            .ok_or(BlockchainError::BlockNotFound(number))
    }

    /// Put block into the database.
    ///
    /// The block is written to a temporary file which is synced and then renamed to the block
    /// file, so a block file is either complete or absent.
    /// Overwriting an existing block is possible, but the chain never does it.
    pub fn save(&mut self, block: &Block) -> BlockchainResult<()> {
        let key = BlockKey::from(block.number());
        let bytes = block.encode();
        debug!("writing block #{} ({} bytes)", key, bytes.len());
        let mut file = NamedTempFile::new_in(&self.path)?;
        file.write_all(&bytes)?;
        file.as_file().sync_all()?;
        file.persist(key.path(&self.path)).map_err(|e| e.error)?;
        self.cache.insert(block.number(), block.clone());
        self.last_number = self.last_number.max(Some(block.number()));
        Ok(())
    }

    /// Lower the highest block number to `last` (`None` for an empty chain).
    ///
    /// Block files above `last` are renamed to `<number>.orphan`, which `load` ignores, so the
    /// next block saved with that number doesn't get mixed up with stale blocks after it.
    pub(crate) fn truncate_to(&mut self, last: Option<u32>) -> BlockchainResult<()> {
        let first_orphan = match last {
            Some(n) => n as u64 + 1,
            None => 0,
        };
        let last_number = match self.last_number {
            Some(n) if n as u64 >= first_orphan => n as u64,
            _ => return Ok(()),
        };
        for number in first_orphan..=last_number {
            let key = BlockKey::from(number as u32);
            let path = key.path(&self.path);
            if path.exists() {
                let orphan = self.path.join(format!("{}.orphan", key));
                warn!("moving block file {} to {}", path.display(), orphan.display());
                fs::rename(&path, &orphan)?;
            }
        }
        self.cache.retain(|number, _| (*number as u64) < first_orphan);
        self.last_number = last;
        Ok(())
    }

    /// Read block from disk, replacing the cached block; a block which can't be read is
    /// evicted from the cache
    fn reload_block(&mut self, number: u32) -> BlockchainResult<Block> {
        match self.read_block(number) {
            Ok(block) => {
                self.cache.insert(number, block.clone());
                Ok(block)
            }
            Err(err) => {
                self.cache.remove(&number);
                Err(err)
            }
        }
    }

    fn read_block(&self, number: u32) -> BlockchainResult<Block> {
        let key = BlockKey::from(number);
        debug!("reading block #{}", key);
        let bytes = match fs::read(key.path(&self.path)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(BlockchainError::BlockNotFound(number))
            }
            Err(err) => return Err(err.into()),
        };
        let block = Block::decode(&bytes)?;
        if block.number() != number {
            return Err(BlockchainError::malformed(format!(
                "file #{} contains block #{}",
                number,
                block.number()
            )));
        }
        Ok(block)
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::blockchain::{Hash256, Transaction};

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    /// Write a linked chain of `len` blocks
    fn write_chain(database: &mut BlockchainDatabase, len: u32) -> Vec<Block> {
        let mut blocks: Vec<Block> = Vec::new();
        for number in 0..len {
            let prevhash = blocks.last().map(|x| x.hash()).unwrap_or(Hash256::ZERO);
            let block = Block::new(
                number,
                prevhash,
                1660000000000.0 + number as f64,
                vec![Transaction::new(format!("note-{}", number)).unwrap()],
            );
            database.save(&block).unwrap();
            blocks.push(block);
        }
        blocks
    }

    #[test]
    fn should_create_directory_on_load() {
        let tempdir = TempDir::new().expect("could not create tempfile");
        let path = tempdir.path().join("blockchain");
        let database = BlockchainDatabase::load(&path).unwrap();
        assert!(path.is_dir());
        assert_eq!(database.path(), path.as_path());
        assert!(database.last_number().is_none());
    }

    #[test]
    fn should_put_and_get_blocks() {
        let tempdir = TempDir::new().expect("could not create tempfile");
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        let blocks = write_chain(&mut database, 2);
        assert!(tempdir.path().join("0").is_file());
        assert!(tempdir.path().join("1").is_file());
        assert_eq!(database.get_block(1).unwrap(), &blocks[1]);
        // read back from disk with a fresh database
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        assert_eq!(database.get_block(0).unwrap(), &blocks[0]);
        assert_eq!(database.get_block(1).unwrap(), &blocks[1]);
    }

    #[test]
    fn should_fail_getting_unexisting_block() {
        let tempdir = TempDir::new().expect("could not create tempfile");
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        assert!(matches!(
            database.get_block(5).unwrap_err(),
            BlockchainError::BlockNotFound(5)
        ));
    }

    #[test]
    fn should_find_highest_block_number() {
        let tempdir = TempDir::new().expect("could not create tempfile");
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        write_chain(&mut database, 3);
        assert_eq!(database.last_number(), Some(2));
        fs::write(tempdir.path().join(".tmpXYZ"), b"garbage").unwrap();
        fs::write(tempdir.path().join("notes.txt"), b"garbage").unwrap();
        let database = BlockchainDatabase::load(tempdir.path()).unwrap();
        assert_eq!(database.last_number(), Some(2));
    }

    #[test]
    fn should_verify_linked_chain() {
        let tempdir = TempDir::new().expect("could not create tempfile");
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        write_chain(&mut database, 3);
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        assert_eq!(
            database.verify(0),
            Verification {
                verified_up_to: 3,
                fully_verified: true
            }
        );
        assert_eq!(
            database.verify(1),
            Verification {
                verified_up_to: 3,
                fully_verified: true
            }
        );
    }

    #[test]
    fn should_stop_verification_at_corrupted_prevhash() {
        let tempdir = TempDir::new().expect("could not create tempfile");
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        write_chain(&mut database, 3);
        // corrupt prevhash of block 1
        let path = tempdir.path().join("1");
        let mut bytes = fs::read(&path).unwrap();
        bytes[4] ^= 0xff;
        fs::write(&path, bytes).unwrap();
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        assert_eq!(
            database.verify(0),
            Verification {
                verified_up_to: 1,
                fully_verified: false
            }
        );
    }

    #[test]
    fn should_stop_verification_at_gap() {
        let tempdir = TempDir::new().expect("could not create tempfile");
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        write_chain(&mut database, 4);
        fs::remove_file(tempdir.path().join("2")).unwrap();
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        assert_eq!(database.last_number(), Some(3));
        assert_eq!(
            database.verify(0),
            Verification {
                verified_up_to: 2,
                fully_verified: false
            }
        );
    }

    #[test]
    fn should_stop_verification_at_malformed_block() {
        let tempdir = TempDir::new().expect("could not create tempfile");
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        write_chain(&mut database, 2);
        fs::write(tempdir.path().join("1"), [0u8; 10]).unwrap();
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        assert!(matches!(
            database.get_block(1).unwrap_err(),
            BlockchainError::MalformedBlock(_)
        ));
        assert_eq!(database.verify(0).verified_up_to, 1);
    }

    #[test]
    fn should_reject_block_stored_under_wrong_number() {
        let tempdir = TempDir::new().expect("could not create tempfile");
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        let blocks = write_chain(&mut database, 1);
        fs::write(tempdir.path().join("3"), blocks[0].encode()).unwrap();
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        assert!(matches!(
            database.get_block(3).unwrap_err(),
            BlockchainError::MalformedBlock(_)
        ));
    }

    #[test]
    fn should_load_same_directory_idempotently() {
        let tempdir = TempDir::new().expect("could not create tempfile");
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        write_chain(&mut database, 3);
        let mut first = BlockchainDatabase::load(tempdir.path()).unwrap();
        let mut second = BlockchainDatabase::load(tempdir.path()).unwrap();
        assert_eq!(first.last_number(), second.last_number());
        assert_eq!(first.verify(0), second.verify(0));
    }

    #[test]
    fn should_see_tampering_after_first_verification() {
        let tempdir = TempDir::new().expect("could not create tempfile");
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        write_chain(&mut database, 3);
        assert_eq!(database.verify(0).verified_up_to, 3);
        let path = tempdir.path().join("1");
        let mut bytes = fs::read(&path).unwrap();
        bytes[4] ^= 0xff;
        fs::write(&path, bytes).unwrap();
        assert_eq!(
            database.verify(0),
            Verification {
                verified_up_to: 1,
                fully_verified: false
            }
        );
        // cache holds what is on disk now
        let genesis_hash = database.get_block(0).unwrap().hash();
        assert_ne!(database.get_block(1).unwrap().prevhash(), genesis_hash);
    }

    #[test]
    fn should_truncate_database() {
        let tempdir = TempDir::new().expect("could not create tempfile");
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        write_chain(&mut database, 4);
        fs::remove_file(tempdir.path().join("2")).unwrap();
        database.truncate_to(Some(1)).unwrap();
        assert_eq!(database.last_number(), Some(1));
        assert!(tempdir.path().join("1").is_file());
        assert!(!tempdir.path().join("3").exists());
        assert!(tempdir.path().join("3.orphan").is_file());
        assert!(matches!(
            database.get_block(3).unwrap_err(),
            BlockchainError::BlockNotFound(3)
        ));
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        assert_eq!(database.last_number(), Some(1));
        database.truncate_to(None).unwrap();
        assert_eq!(database.last_number(), None);
        assert!(tempdir.path().join("0.orphan").is_file());
        assert!(BlockchainDatabase::load(tempdir.path())
            .unwrap()
            .last_number()
            .is_none());
    }

    #[test]
    fn should_verify_empty_database() {
        let tempdir = TempDir::new().expect("could not create tempfile");
        let mut database = BlockchainDatabase::load(tempdir.path()).unwrap();
        assert_eq!(
            database.verify(0),
            Verification {
                verified_up_to: 0,
                fully_verified: true
            }
        );
    }
}

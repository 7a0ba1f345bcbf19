//! Note helper
//!
//! An helper to submit note files to the chain and to keep track of the notes found on it

use cryptonotes::blockchain::{Chain, Transaction};
use cryptonotes::bridge::content_store::LocalContentStore;
use cryptonotes::notes::{CryptoNote, NoteIndex};

use std::path::Path;

pub struct NoteHelper;

impl NoteHelper {
    /// Read note at `path`, upload it to the content store and submit its transaction to the chain
    pub async fn add_note_file(
        path: &Path,
        chain: &mut Chain,
        store: &LocalContentStore,
    ) -> anyhow::Result<CryptoNote> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to read note {}: {}", path.display(), e))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string());
        let (note, transaction) = CryptoNote::publish(store, &data, name)
            .map_err(|e| anyhow::anyhow!("failed to publish note {}: {}", path.display(), e))?;
        info!(
            "note {} ({} bytes) submitted to the chain",
            path.display(),
            note.size()
        );
        chain.add_transaction(transaction);
        Ok(note)
    }

    /// Index the note referenced by `transaction`, found in block `block`.
    /// Returns whether the note has been added to the index
    pub fn index_transaction(
        index: &mut NoteIndex,
        store: &LocalContentStore,
        block: u32,
        transaction: &Transaction,
    ) -> bool {
        match CryptoNote::resolve(store, transaction) {
            Ok((metadata_id, note)) => {
                debug!("found note {} in block #{}", metadata_id, block);
                index.insert(metadata_id, block, note)
            }
            Err(err) => {
                warn!("ignoring transaction in block #{}: {}", block, err);
                false
            }
        }
    }

    /// Build the note index from the blocks of the chain
    pub fn rebuild_index(chain: &mut Chain, store: &LocalContentStore) -> anyhow::Result<NoteIndex> {
        let mut index = NoteIndex::new();
        let tail = match chain.tail_number() {
            Some(n) => n,
            None => return Ok(index),
        };
        for number in 0..=tail {
            let block = chain.get_block(number)?;
            for transaction in block.transactions() {
                Self::index_transaction(&mut index, store, number, transaction);
            }
        }
        info!("found {} notes on the chain", index.len());
        Ok(index)
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use cryptonotes::blockchain::ChainOptions;

    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[tokio::test]
    async fn should_add_note_file_and_rebuild_index() {
        let tempdir = TempDir::new().expect("could not create tempdir");
        let mut chain = Chain::open(ChainOptions::new(tempdir.path().join("chain"))).unwrap();
        let store = LocalContentStore::init(tempdir.path().join("content")).unwrap();
        let mut note_file = NamedTempFile::new().expect("could not create tempfile");
        write!(note_file, "remember the milk").unwrap();
        let note = NoteHelper::add_note_file(note_file.path(), &mut chain, &store)
            .await
            .unwrap();
        assert_eq!(note.size(), 17);
        assert_eq!(chain.pending_len(), 1);
        // not on chain yet
        assert!(NoteHelper::rebuild_index(&mut chain, &store)
            .unwrap()
            .is_empty());
        assert_eq!(chain.mine(1, None).unwrap(), true);
        let index = NoteHelper::rebuild_index(&mut chain, &store).unwrap();
        assert_eq!(index.len(), 1);
        let (_, indexed) = index.iter().next().unwrap();
        assert_eq!(indexed.block, 1);
        assert_eq!(indexed.note, note);
    }

    #[tokio::test]
    async fn should_fail_adding_missing_note_file() {
        let tempdir = TempDir::new().expect("could not create tempdir");
        let mut chain = Chain::open(ChainOptions::new(tempdir.path().join("chain"))).unwrap();
        let store = LocalContentStore::init(tempdir.path().join("content")).unwrap();
        assert!(NoteHelper::add_note_file(
            tempdir.path().join("missing.txt").as_path(),
            &mut chain,
            &store
        )
        .await
        .is_err());
        assert_eq!(chain.pending_len(), 0);
    }

    #[test]
    fn should_skip_foreign_transactions() {
        let tempdir = TempDir::new().expect("could not create tempdir");
        let store = LocalContentStore::init(tempdir.path()).unwrap();
        let mut index = NoteIndex::new();
        let transaction = Transaction::new("not a note").unwrap();
        assert_eq!(
            NoteHelper::index_transaction(&mut index, &store, 3, &transaction),
            false
        );
        assert!(index.is_empty());
    }
}

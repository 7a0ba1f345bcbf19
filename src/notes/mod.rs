//! # Notes
//!
//! This module exposes the note datatypes recorded on the blockchain.
//!
//! A note content is stored in the content store; its metadata is stored there too, and the
//! metadata content id is the payload of the blockchain transaction.

mod errors;

pub use errors::{NoteError, NoteResult};

use crate::blockchain::{now_millis, Transaction};
use crate::bridge::content_store::{ContentId, ContentStore};

use std::collections::BTreeMap;
use std::str::FromStr;

/// Metadata of a note
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct CryptoNote {
    /// content id of the note content
    content: ContentId,
    /// optional name of the note (e.g. the original file name)
    #[serde(default)]
    name: Option<String>,
    /// content size in bytes
    size: u64,
    /// milliseconds since UNIX epoch
    created_at: f64,
}

impl CryptoNote {
    /// Instantiates a new `CryptoNote`, created now
    pub fn new(content: ContentId, name: Option<String>, size: u64) -> Self {
        Self {
            content,
            name,
            size,
            created_at: now_millis(),
        }
    }

    pub fn content(&self) -> &ContentId {
        &self.content
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn created_at(&self) -> f64 {
        self.created_at
    }

    /// Upload `data` and the note metadata to `store`.
    /// Returns the note and the transaction to submit to the chain
    pub fn publish<S>(
        store: &S,
        data: &[u8],
        name: Option<String>,
    ) -> NoteResult<(Self, Transaction)>
    where
        S: ContentStore,
    {
        let content = store.put(data)?;
        let note = Self::new(content, name, data.len() as u64);
        let metadata = serde_json::to_vec(&note)?;
        let metadata_id = store.put(&metadata)?;
        debug!("note {} uploaded with metadata {}", note.content, metadata_id);
        let transaction = Transaction::new(metadata_id.as_str())?;
        Ok((note, transaction))
    }

    /// Resolve the note referenced by `transaction`.
    /// Returns the metadata content id and the note
    pub fn resolve<S>(store: &S, transaction: &Transaction) -> NoteResult<(ContentId, Self)>
    where
        S: ContentStore,
    {
        let metadata_id = String::from_utf8(transaction.payload().to_vec())?;
        let metadata_id = ContentId::from_str(&metadata_id)?;
        let metadata = store
            .get(&metadata_id)?
            .ok_or_else(|| NoteError::MetadataNotFound(metadata_id.clone()))?;
        let note = serde_json::from_slice(&metadata)?;
        Ok((metadata_id, note))
    }

    /// Read the note content from `store`
    pub fn read_content<S>(&self, store: &S) -> NoteResult<Option<Vec<u8>>>
    where
        S: ContentStore,
    {
        store.get(&self.content).map_err(NoteError::from)
    }
}

/// A note found on the chain
#[derive(Debug, PartialEq, Clone)]
pub struct IndexedNote {
    /// number of the block containing the note
    pub block: u32,
    pub note: CryptoNote,
}

/// Notes known by the application, keyed by metadata content id
#[derive(Debug, Default)]
pub struct NoteIndex {
    notes: BTreeMap<ContentId, IndexedNote>,
}

impl NoteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register note; returns whether the note wasn't known yet
    pub fn insert(&mut self, metadata_id: ContentId, block: u32, note: CryptoNote) -> bool {
        if self.notes.contains_key(&metadata_id) {
            return false;
        }
        self.notes.insert(metadata_id, IndexedNote { block, note });
        true
    }

    pub fn get(&self, metadata_id: &ContentId) -> Option<&IndexedNote> {
        self.notes.get(metadata_id)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ContentId, &IndexedNote)> {
        self.notes.iter()
    }
}

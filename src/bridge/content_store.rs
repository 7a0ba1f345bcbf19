//! # Content store
//!
//! a bridge to interface with a content-addressed storage: bytes go in, a content identifier
//! comes out.

use data_encoding::HEXLOWER;
use ring::digest::{digest, SHA256};
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;
use thiserror::Error;

/// The result type returned by an operation on the content store
pub type ContentStoreResult<T> = Result<T, ContentStoreError>;

/// Describe an error on the content store
#[derive(Debug, Error)]
pub enum ContentStoreError {
    #[error("io error: {0}")]
    Io(io::Error),
    #[error("invalid content id: {0}")]
    InvalidContentId(String),
}

impl From<io::Error> for ContentStoreError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Identifier of a stored content
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    /// Content id of `data`: lowercase hex sha256
    pub fn of(data: &[u8]) -> Self {
        Self(HEXLOWER.encode(digest(&SHA256, data).as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContentId {
    type Err = ContentStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match HEXLOWER.decode(s.as_bytes()) {
            Ok(bytes) if bytes.len() == 32 => Ok(Self(s.to_string())),
            _ => Err(ContentStoreError::InvalidContentId(s.to_string())),
        }
    }
}

impl TryFrom<String> for ContentId {
    type Error = ContentStoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_str(&s)
    }
}

impl From<ContentId> for String {
    fn from(id: ContentId) -> Self {
        id.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A content-addressed storage
pub trait ContentStore {
    /// Store `data` and return its content identifier
    fn put(&self, data: &[u8]) -> ContentStoreResult<ContentId>;

    /// Get content by its identifier; `None` if unknown
    fn get(&self, id: &ContentId) -> ContentStoreResult<Option<Vec<u8>>>;
}

/// Content store keeping each content in a file named after its id
#[derive(Debug)]
pub struct LocalContentStore {
    path: PathBuf,
}

impl LocalContentStore {
    /// Initialize the content store at `path`; the directory is created if missing
    pub fn init<P>(path: P) -> ContentStoreResult<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().to_path_buf();
        fs::create_dir_all(&path)?;
        debug!("content store ready at {}", path.display());
        Ok(Self { path })
    }
}

impl ContentStore for LocalContentStore {
    fn put(&self, data: &[u8]) -> ContentStoreResult<ContentId> {
        let id = ContentId::of(data);
        let path = self.path.join(id.as_str());
        if path.exists() {
            debug!("content {} is already stored", id);
            return Ok(id);
        }
        let mut file = NamedTempFile::new_in(&self.path)?;
        file.write_all(data)?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| e.error)?;
        debug!("stored content {} ({} bytes)", id, data.len());
        Ok(id)
    }

    fn get(&self, id: &ContentId) -> ContentStoreResult<Option<Vec<u8>>> {
        match fs::read(self.path.join(id.as_str())) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn should_init_content_store() {
        let tempdir = TempDir::new().expect("could not create tempfile");
        let path = tempdir.path().join("content");
        LocalContentStore::init(&path).unwrap();
        assert!(path.is_dir());
    }

    #[test]
    fn should_put_and_get_content() {
        let tempdir = TempDir::new().expect("could not create tempfile");
        let store = LocalContentStore::init(tempdir.path()).unwrap();
        let id = store.put(b"Test file for cryptonote").unwrap();
        assert_eq!(id, ContentId::of(b"Test file for cryptonote"));
        assert_eq!(
            store.get(&id).unwrap().unwrap(),
            b"Test file for cryptonote".to_vec()
        );
        // same content, same id
        assert_eq!(store.put(b"Test file for cryptonote").unwrap(), id);
        assert!(store.get(&ContentId::of(b"other")).unwrap().is_none());
    }

    #[test]
    fn should_parse_content_id() {
        let id = ContentId::of(b"");
        assert_eq!(
            id.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(ContentId::from_str(id.as_str()).unwrap(), id);
        assert!(ContentId::from_str("cafebabe").is_err());
        assert!(ContentId::from_str("../../etc/passwd").is_err());
    }
}

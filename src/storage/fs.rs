//! Filesystem-backed key-value store.
//!
//! One JSON file per key under a root directory. Writes replace the whole
//! file, so concurrent writers to the same key resolve last-writer-wins
//! without corrupting the blob.

use super::KeyValueStore;
use crate::error::{EkkoError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// File-per-key store rooted at a directory.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        // Keys are opaque ids plus fixed suffixes; reject anything that
        // could escape the root directory.
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(EkkoError::Storage(format!("invalid key: {:?}", key)));
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FsStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::write(&path, value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

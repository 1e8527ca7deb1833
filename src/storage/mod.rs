//! Key-value storage port for Ekko.
//!
//! Transcripts, vector indexes, summaries, and conversation histories are
//! all persisted as JSON blobs behind this small interface, so the
//! file-per-key layout can later be swapped for a real key-value store
//! without touching retrieval or chat logic.

mod fs;
mod locks;
mod memory;

pub use fs::FsStore;
pub use locks::KeyedMutex;
pub use memory::MemoryStore;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for key-value storage backends.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the blob stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store a blob under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove `key`. Returns whether a value existed.
    async fn delete(&self, key: &str) -> Result<bool>;
}

/// Deserialize a stored JSON value, if present.
pub async fn get_json<T: serde::de::DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Serialize a value as JSON and store it.
pub async fn put_json<T: serde::Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    store.put(key, &bytes).await
}

//! Per-key async locks.
//!
//! Read-modify-write cycles on per-key blobs (conversation history, vector
//! index builds) must not interleave for the same key. Locks are created on
//! first use and kept for the process lifetime; the key space is small
//! (one per media or conversation).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A map of named async mutexes, one per key.
pub struct KeyedMutex {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedMutex {
    /// Create an empty lock map.
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the lock for `key`, waiting if another task holds it.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

impl Default for KeyedMutex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_same_key_serializes() {
        let locks = Arc::new(KeyedMutex::new());
        let in_section = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let in_section = in_section.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock("shared").await;
                let active = in_section.fetch_add(1, Ordering::SeqCst);
                assert_eq!(active, 0);
                tokio::task::yield_now().await;
                in_section.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_distinct_keys_are_independent() {
        let locks = KeyedMutex::new();
        let _a = locks.lock("a").await;
        // Must not deadlock while "a" is held.
        let _b = locks.lock("b").await;
    }
}

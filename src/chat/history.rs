//! Conversation history persistence.
//!
//! Histories are keyed by (media_id, user_id) and bounded: only the most
//! recent turns survive a write. Anonymous callers share the "anon"
//! bucket per media item; that bucket is a demo-system tradeoff, not a
//! security boundary.

use crate::error::Result;
use crate::storage::{self, KeyedMutex, KeyValueStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{instrument, warn};

/// Default maximum turns retained per conversation key.
pub const MAX_HISTORY_TURNS: usize = 40;

/// Bucket shared by all unauthenticated callers of a media item.
pub const ANON_USER: &str = "anon";

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Title-case label for prompt rendering.
    pub fn title(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }

    /// Lowercase label for prompt rendering.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Persists per-(media, user) conversation turns with bounded retention.
pub struct ConversationStore {
    store: Arc<dyn KeyValueStore>,
    locks: KeyedMutex,
    limit: usize,
}

impl ConversationStore {
    /// Create a conversation store with the default retention cap.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_limit(store, MAX_HISTORY_TURNS)
    }

    /// Create a conversation store retaining at most `limit` turns per
    /// conversation key.
    pub fn with_limit(store: Arc<dyn KeyValueStore>, limit: usize) -> Self {
        Self {
            store,
            locks: KeyedMutex::new(),
            limit,
        }
    }

    fn history_key(media_id: &str, user_id: Option<&str>) -> String {
        let uid = user_id.filter(|u| !u.is_empty()).unwrap_or(ANON_USER);
        format!("{}_chat_{}", media_id, uid)
    }

    /// Load the stored history for a key, oldest turn first.
    ///
    /// An unreadable history blob is treated as empty rather than an
    /// error; the conversation restarts instead of wedging.
    pub async fn load(
        &self,
        media_id: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<ConversationTurn>> {
        let key = Self::history_key(media_id, user_id);
        match self.store.get(&key).await? {
            Some(bytes) => match serde_json::from_slice(&bytes) {
                Ok(turns) => Ok(turns),
                Err(e) => {
                    warn!("Discarding unreadable history for {}: {}", key, e);
                    Ok(Vec::new())
                }
            },
            None => Ok(Vec::new()),
        }
    }

    /// Append turns to a key's history, retaining only the most recent
    /// turns up to the store's limit. Returns the full stored history
    /// after the write. The read-modify-write cycle holds the per-key
    /// lock so concurrent turns for the same key serialize.
    #[instrument(skip(self, turns), fields(media_id = %media_id))]
    pub async fn append(
        &self,
        media_id: &str,
        user_id: Option<&str>,
        turns: Vec<ConversationTurn>,
    ) -> Result<Vec<ConversationTurn>> {
        let key = Self::history_key(media_id, user_id);
        let _guard = self.locks.lock(&key).await;

        let mut history = self.load(media_id, user_id).await?;
        history.extend(turns);
        if history.len() > self.limit {
            history.drain(..history.len() - self.limit);
        }
        storage::put_json(self.store.as_ref(), &key, &history).await?;
        Ok(history)
    }

    /// Remove all history for a key. Idempotent: succeeds even when no
    /// history exists.
    pub async fn clear(&self, media_id: &str, user_id: Option<&str>) -> Result<bool> {
        let key = Self::history_key(media_id, user_id);
        let _guard = self.locks.lock(&key).await;
        self.store.delete(&key).await?;
        Ok(true)
    }
}

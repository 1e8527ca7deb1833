//! Composition root.
//!
//! [`Engine`] wires the storage port, embedder, completion backend, and
//! the retrieval and chat services into one handle. Library consumers
//! either build it from [`Settings`] or inject their own collaborators
//! through [`Engine::with_components`].

use crate::chat::{
    ChatEngine, ChatMode, ChatResponse, ConversationStore, ConversationTurn, IntentClassifier,
    KeywordIntentClassifier,
};
use crate::completion::{CompletionClient, OpenAICompletion};
use crate::config::{EmbeddingProvider, Prompts, Settings};
use crate::embedding::{is_api_key_configured, Embedder, HashEmbedder, OpenAIEmbedder};
use crate::error::Result;
use crate::index::VectorIndex;
use crate::retrieval::{RetrievalResult, Retriever};
use crate::storage::{FsStore, KeyValueStore};
use crate::summary::{Summarizer, Summary};
use crate::transcript::SegmentStore;
use std::sync::Arc;
use tracing::{info, warn};

/// The assembled retrieval and chat engine.
pub struct Engine {
    settings: Settings,
    index: Arc<VectorIndex>,
    retriever: Retriever,
    chat: ChatEngine,
    summarizer: Summarizer,
}

impl Engine {
    /// Build an engine from settings, with file-backed storage under the
    /// configured data directory and OpenAI completion and embedding
    /// backends.
    pub fn new(settings: Settings) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FsStore::new(settings.data_dir())?);
        let completion: Arc<dyn CompletionClient> =
            Arc::new(OpenAICompletion::new(&settings.chat.model));
        let embedder = select_embedder(&settings);
        Ok(Self::with_components(
            settings,
            store,
            completion,
            embedder,
            Arc::new(KeywordIntentClassifier::new()),
            Prompts::default(),
        ))
    }

    /// Build an engine from explicit collaborators. This is the seam for
    /// tests and for embedding applications that bring their own storage
    /// or model backends.
    pub fn with_components(
        settings: Settings,
        store: Arc<dyn KeyValueStore>,
        completion: Arc<dyn CompletionClient>,
        embedder: Option<Arc<dyn Embedder>>,
        intent: Arc<dyn IntentClassifier>,
        prompts: Prompts,
    ) -> Self {
        let segments = Arc::new(SegmentStore::new(store.clone()));
        let index = Arc::new(VectorIndex::new(store.clone(), embedder));
        let retriever = Retriever::new(segments.clone(), index.clone());
        let history = Arc::new(ConversationStore::with_limit(
            store.clone(),
            settings.chat.history_limit as usize,
        ));
        let chat = ChatEngine::new(
            segments.clone(),
            history,
            completion.clone(),
            intent,
            prompts.clone(),
            settings.retrieval.clone(),
        );
        let summarizer = Summarizer::new(segments, store, completion, prompts);
        Self {
            settings,
            index,
            retriever,
            chat,
            summarizer,
        }
    }

    /// The settings this engine was built with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Retrieve the most relevant transcript segments for a query, using
    /// the configured top-k.
    pub async fn retrieve(&self, media_id: &str, query: &str) -> Result<Vec<RetrievalResult>> {
        self.retrieve_k(media_id, query, self.settings.retrieval.top_k as usize)
            .await
    }

    /// Retrieve with an explicit result count.
    pub async fn retrieve_k(
        &self,
        media_id: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        self.retriever.retrieve(media_id, query, k).await
    }

    /// Answer a chat question about a media item.
    pub async fn chat(
        &self,
        media_id: &str,
        question: &str,
        mode: ChatMode,
        user_id: Option<&str>,
    ) -> Result<ChatResponse> {
        self.chat.chat(media_id, question, mode, user_id).await
    }

    /// Stored conversation history for a (media, user) key.
    pub async fn list_history(
        &self,
        media_id: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<ConversationTurn>> {
        self.chat.list_history(media_id, user_id).await
    }

    /// Delete a conversation's history. Idempotent.
    pub async fn clear_history(&self, media_id: &str, user_id: Option<&str>) -> Result<bool> {
        self.chat.clear_history(media_id, user_id).await
    }

    /// Summarize a media item, serving the cached summary unless `force`.
    pub async fn summarize(&self, media_id: &str, force: bool) -> Result<Summary> {
        self.summarizer.summarize(media_id, force).await
    }

    /// Drop the persisted vector index for a media item. The next search
    /// rebuilds it from the current transcript.
    pub async fn invalidate_index(&self, media_id: &str) -> Result<bool> {
        self.index.invalidate(media_id).await
    }

    /// Drop the cached summary for a media item.
    pub async fn invalidate_summary(&self, media_id: &str) -> Result<bool> {
        self.summarizer.invalidate(media_id).await
    }
}

/// Pick the embedding backend for the configured provider. An OpenAI
/// provider without an API key degrades to no embedder; retrieval then
/// runs on the BM25 fallback.
fn select_embedder(settings: &Settings) -> Option<Arc<dyn Embedder>> {
    match settings.embedding.provider {
        EmbeddingProvider::OpenAI => {
            if is_api_key_configured() {
                info!("Using OpenAI embeddings ({})", settings.embedding.model);
                Some(Arc::new(OpenAIEmbedder::new(
                    &settings.embedding.model,
                    settings.embedding.dimensions as usize,
                )))
            } else {
                warn!("OPENAI_API_KEY not set, vector retrieval disabled");
                None
            }
        }
        EmbeddingProvider::Hash => Some(Arc::new(HashEmbedder::with_dimensions(
            settings.embedding.dimensions as usize,
        ))),
        EmbeddingProvider::None => None,
    }
}

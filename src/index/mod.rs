//! Per-media flat inner-product vector index.
//!
//! Built lazily on the first search for a media item: every segment text
//! is embedded in one batch, L2-normalized so inner product behaves as
//! cosine similarity, and persisted through the storage port alongside a
//! small metadata record. Later searches reuse the persisted vectors.
//!
//! The index does not detect staleness: if segments change after a build,
//! the stored vectors are silently out of date until the index keys are
//! deleted.

use crate::embedding::{l2_normalize, Embedder};
use crate::error::Result;
use crate::retrieval::RetrievalResult;
use crate::storage::{self, KeyedMutex, KeyValueStore};
use crate::transcript::Segment;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Outcome of a vector search.
///
/// `Unavailable` signals capability degradation (no embedding backend,
/// or one that is currently failing), which the retrieval orchestrator
/// answers with a lexical fallback. It is not an error.
#[derive(Debug)]
pub enum IndexSearch {
    /// Ranked hits, best first. May be empty.
    Hits(Vec<RetrievalResult>),
    /// The vector backend is not available.
    Unavailable,
}

/// Persisted index payload: one vector per segment at build time.
#[derive(Debug, Serialize, Deserialize)]
struct StoredIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

/// Persisted index metadata.
#[derive(Debug, Serialize, Deserialize)]
struct IndexMeta {
    count: usize,
}

/// Outcome of loading or building the persisted index.
enum Loaded {
    /// A usable index.
    Ready(StoredIndex),
    /// Nothing to index (no segments).
    Empty,
    /// The embedding backend failed; the vector tier is out for this
    /// search and the caller falls back.
    Degraded,
}

/// Flat inner-product index over transcript segments, one per media item.
pub struct VectorIndex {
    store: Arc<dyn KeyValueStore>,
    embedder: Option<Arc<dyn Embedder>>,
    build_locks: KeyedMutex,
}

impl VectorIndex {
    /// Create an index backed by the given store and embedder.
    ///
    /// Pass `None` as the embedder when no backend is usable; every search
    /// then reports [`IndexSearch::Unavailable`].
    pub fn new(store: Arc<dyn KeyValueStore>, embedder: Option<Arc<dyn Embedder>>) -> Self {
        Self {
            store,
            embedder,
            build_locks: KeyedMutex::new(),
        }
    }

    fn index_key(media_id: &str) -> String {
        format!("{}_index", media_id)
    }

    fn meta_key(media_id: &str) -> String {
        format!("{}_index_meta", media_id)
    }

    /// Drop the persisted index for a media item. Returns whether an index
    /// existed. The next search rebuilds from current segments.
    pub async fn invalidate(&self, media_id: &str) -> Result<bool> {
        let _guard = self.build_locks.lock(media_id).await;
        let existed = self.store.delete(&Self::index_key(media_id)).await?;
        self.store.delete(&Self::meta_key(media_id)).await?;
        Ok(existed)
    }

    /// Search the index for segments similar to `query`.
    #[instrument(skip(self, segments, query), fields(media_id = %media_id))]
    pub async fn search(
        &self,
        media_id: &str,
        segments: &[Segment],
        query: &str,
        k: usize,
    ) -> Result<IndexSearch> {
        let Some(embedder) = &self.embedder else {
            return Ok(IndexSearch::Unavailable);
        };

        let index = match self.load_or_build(media_id, segments, embedder.as_ref()).await? {
            Loaded::Ready(index) => index,
            Loaded::Empty => return Ok(IndexSearch::Hits(Vec::new())),
            Loaded::Degraded => return Ok(IndexSearch::Unavailable),
        };

        // A failing embedding backend at query time is also capability
        // degradation, not an error.
        let mut query_vec = match embedder.embed(query).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!("Query embedding failed, vector tier unavailable: {}", e);
                return Ok(IndexSearch::Unavailable);
            }
        };
        l2_normalize(&mut query_vec);

        let mut scored: Vec<(usize, f32)> = index
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, inner_product(&query_vec, v)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        // Vector ids map back to segment positions at build time; skip any
        // that no longer resolve.
        let hits: Vec<RetrievalResult> = scored
            .into_iter()
            .filter_map(|(i, score)| {
                segments.get(i).map(|seg| RetrievalResult {
                    text: seg.text.clone(),
                    start: seg.start,
                    end: seg.end,
                    score,
                })
            })
            .collect();

        Ok(IndexSearch::Hits(hits))
    }

    /// Load the persisted index, building and persisting it first if
    /// absent. Storage errors propagate; an embedding failure during the
    /// build degrades to [`Loaded::Degraded`] so the search falls back
    /// instead of erroring.
    async fn load_or_build(
        &self,
        media_id: &str,
        segments: &[Segment],
        embedder: &dyn Embedder,
    ) -> Result<Loaded> {
        let index_key = Self::index_key(media_id);

        if let Some(index) = storage::get_json::<StoredIndex>(self.store.as_ref(), &index_key).await? {
            debug!("Loaded persisted index ({} vectors)", index.vectors.len());
            return Ok(Loaded::Ready(index));
        }

        // At-most-once build per media id. A concurrent builder may have
        // finished while we waited, so re-check under the lock.
        let _guard = self.build_locks.lock(media_id).await;
        if let Some(index) = storage::get_json::<StoredIndex>(self.store.as_ref(), &index_key).await? {
            return Ok(Loaded::Ready(index));
        }

        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        if texts.is_empty() {
            return Ok(Loaded::Empty);
        }

        info!("Building vector index for {} ({} segments)", media_id, texts.len());
        let mut vectors = match embedder.embed_batch(&texts).await {
            Ok(vectors) => vectors,
            Err(e) => {
                warn!("Index build embedding failed, vector tier unavailable: {}", e);
                return Ok(Loaded::Degraded);
            }
        };
        for v in vectors.iter_mut() {
            l2_normalize(v);
        }

        let index = StoredIndex {
            dimension: embedder.dimensions(),
            vectors,
        };
        storage::put_json(self.store.as_ref(), &index_key, &index).await?;
        storage::put_json(
            self.store.as_ref(),
            &Self::meta_key(media_id),
            &IndexMeta { count: texts.len() },
        )
        .await?;

        Ok(Loaded::Ready(index))
    }
}

/// Inner product of two vectors. Mismatched lengths score zero.
fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

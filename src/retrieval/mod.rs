//! Segment retrieval for Ekko.
//!
//! Three tiers trade quality against availability: the vector index gives
//! the best ranking when an embedding backend exists, BM25 is the
//! probabilistic fallback, and lexical overlap scoring is always on.
//! Callers never block on model availability.

mod bm25;
mod lexical;

pub use bm25::Bm25Ranker;
pub use lexical::LexicalRanker;

use crate::error::Result;
use crate::index::{IndexSearch, VectorIndex};
use crate::transcript::SegmentStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// A retrieved segment with its relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Segment text.
    pub text: String,
    /// Start time in seconds, if the segment carries timing.
    pub start: Option<f64>,
    /// End time in seconds, if the segment carries timing.
    pub end: Option<f64>,
    /// Relevance score, higher is better. Scores are only comparable
    /// within one retrieval tier.
    pub score: f32,
}

/// Orchestrates the retrieval fallback chain.
pub struct Retriever {
    segments: Arc<SegmentStore>,
    index: Arc<VectorIndex>,
    bm25: Bm25Ranker,
}

impl Retriever {
    /// Create a retriever over the given segment store and vector index.
    pub fn new(segments: Arc<SegmentStore>, index: Arc<VectorIndex>) -> Self {
        Self {
            segments,
            index,
            bm25: Bm25Ranker::new(),
        }
    }

    /// Retrieve the top-k segments for a query.
    ///
    /// Tries the vector index first; when it is unavailable or yields no
    /// hits, falls back to BM25 over the current segments. A missing
    /// transcript surfaces as [`crate::EkkoError::TranscriptNotFound`].
    #[instrument(skip(self, query), fields(media_id = %media_id))]
    pub async fn retrieve(
        &self,
        media_id: &str,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievalResult>> {
        let record = self.segments.load(media_id).await?;
        let segments = self.segments.retrieval_segments(&record);

        match self.index.search(media_id, &segments, query, k).await? {
            IndexSearch::Hits(hits) if !hits.is_empty() => {
                debug!("Vector index returned {} hits", hits.len());
                return Ok(hits);
            }
            IndexSearch::Hits(_) => debug!("Vector index empty, falling back to BM25"),
            IndexSearch::Unavailable => debug!("Vector index unavailable, falling back to BM25"),
        }

        Ok(self.bm25.rank(&segments, query, k))
    }
}

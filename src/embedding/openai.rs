//! OpenAI embedding backend.
//!
//! Transcript segments are embedded in fixed-size request chunks. Each
//! response is re-ordered by index, checked against the requested count
//! and the configured dimension, and L2-normalized on the way out, so
//! downstream inner-product scoring behaves as cosine similarity without
//! trusting the API to return unit vectors.

use super::{l2_normalize, Embedder};
use crate::completion::create_client;
use crate::error::{EkkoError, Result};
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Segment texts sent per embedding request. An index build over a full
/// transcript (up to 120 synthetic segments) fits in two requests.
const SEGMENTS_PER_REQUEST: usize = 100;

/// OpenAI-based embedder with a fixed output dimension.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// Create an embedder for the given model and output dimension.
    pub fn new(model: &str, dimensions: usize) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            dimensions,
        }
    }

    async fn request_chunk(&self, chunk: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(chunk.to_vec()))
            .dimensions(self.dimensions as u32)
            .build()
            .map_err(|e| EkkoError::Embedding(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| EkkoError::OpenAI(format!("Embedding API error: {}", e)))?;

        // The API does not guarantee response order.
        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        let vectors: Vec<Vec<f32>> = data.into_iter().map(|d| d.embedding).collect();

        check_and_normalize(vectors, chunk.len(), self.dimensions)
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EkkoError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(SEGMENTS_PER_REQUEST) {
            all.extend(self.request_chunk(chunk).await?);
        }

        debug!("Embedded {} texts", all.len());
        Ok(all)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Validate a response batch against the request and normalize each
/// vector to unit L2 norm. A count or dimension mismatch means the
/// vectors cannot be aligned with their segments and the batch is
/// rejected.
fn check_and_normalize(
    mut vectors: Vec<Vec<f32>>,
    expected_count: usize,
    dimensions: usize,
) -> Result<Vec<Vec<f32>>> {
    if vectors.len() != expected_count {
        return Err(EkkoError::Embedding(format!(
            "Expected {} embeddings, got {}",
            expected_count,
            vectors.len()
        )));
    }
    for vector in vectors.iter_mut() {
        if vector.len() != dimensions {
            return Err(EkkoError::Embedding(format!(
                "Expected {}-dimensional embedding, got {}",
                dimensions,
                vector.len()
            )));
        }
        l2_normalize(vector);
    }
    Ok(vectors)
}

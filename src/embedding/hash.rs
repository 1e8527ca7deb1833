//! Deterministic hash-based embedder.
//!
//! A test/dev fallback for environments without an embedding backend. Each
//! text maps to a reproducible pseudo-random unit vector derived from a
//! hash of its content, so the same text always embeds identically and
//! index searches stay consistent across runs. The vectors carry no
//! semantic meaning and must never stand in for a real model in
//! production.

use super::{l2_normalize, Embedder};
use crate::error::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hash::{DefaultHasher, Hash, Hasher};

/// Deterministic content-hash embedder.
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    /// Create a hash embedder with the default 384 dimensions.
    pub fn new() -> Self {
        Self::with_dimensions(384)
    }

    /// Create a hash embedder with custom dimensions.
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());

        let mut vector: Vec<f32> = (0..self.dimensions)
            .map(|_| rng.gen::<f32>() - 0.5)
            .collect();
        l2_normalize(&mut vector);
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_one(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deterministic() {
        let embedder = HashEmbedder::new();
        let a = embedder.embed("the cat sat").await.unwrap();
        let b = embedder.embed("the cat sat").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 384);
    }

    #[tokio::test]
    async fn test_distinct_texts_differ() {
        let embedder = HashEmbedder::new();
        let a = embedder.embed("the cat sat").await.unwrap();
        let b = embedder.embed("the dog ran").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_unit_norm() {
        let embedder = HashEmbedder::with_dimensions(16);
        let v = embedder.embed("hello").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }
}

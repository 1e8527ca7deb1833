//! Error types for Ekko.

use thiserror::Error;

/// Library-level error type for Ekko operations.
///
/// Backend degradation (a missing embedding model or vector index) is
/// deliberately not represented here. It is a capability signal carried
/// by [`crate::index::IndexSearch::Unavailable`] and consumed by the
/// retrieval fallback chain, never surfaced as an error.
#[derive(Error, Debug)]
pub enum EkkoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transcript not found: {0}")]
    TranscriptNotFound(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector index error: {0}")]
    Index(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Completion failed: {0}")]
    Completion(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Ekko operations.
pub type Result<T> = std::result::Result<T, EkkoError>;

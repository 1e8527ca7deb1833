//! Ekko - Retrieval-Augmented Search and Chat over Media Transcripts
//!
//! The retrieval core of a media transcription service. Transcripts arrive
//! from an external transcription pipeline; Ekko turns their segments into a
//! queryable knowledge base and answers questions grounded in them.
//!
//! The name "Ekko" comes from the Norwegian word for "echo."
//!
//! # Overview
//!
//! Ekko allows you to:
//! - Search transcript segments with a three-tier fallback chain
//!   (vector index, BM25, lexical overlap)
//! - Chat over a transcript with grounded, agent, or general modes
//! - Keep bounded per-user conversation history
//! - Produce cached structured summaries of a transcript
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `storage` - Key-value storage port (filesystem and in-memory backends)
//! - `transcript` - Transcript records and pseudo-segmentation
//! - `embedding` - Embedding generation
//! - `index` - Per-media flat inner-product vector index
//! - `retrieval` - Lexical, BM25, and orchestrated retrieval
//! - `completion` - Text completion collaborator
//! - `chat` - Chat engine, conversation history, translation intent
//! - `summary` - Structured transcript summaries
//! - `engine` - Composition root
//!
//! # Example
//!
//! ```rust,no_run
//! use ekko::config::Settings;
//! use ekko::engine::Engine;
//!
//! #[tokio::main]
//! async fn main() -> ekko::Result<()> {
//!     let settings = Settings::load()?;
//!     let engine = Engine::new(settings)?;
//!
//!     let results = engine.retrieve("media123", "binary numbers").await?;
//!     println!("Found {} segments", results.len());
//!
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod index;
pub mod retrieval;
pub mod storage;
pub mod summary;
pub mod transcript;

pub use error::{EkkoError, Result};

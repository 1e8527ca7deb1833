//! Text completion collaborator.
//!
//! Chat and summarization consume a single-shot `complete(prompt)` call.
//! Failures here are transient from the caller's perspective and always
//! propagate: there is no meaningful fallback text to synthesize, so the
//! transport layer decides whether to retry.

mod client;
mod openai;

pub use client::{create_client, create_client_with_timeout};
pub use openai::OpenAICompletion;

use crate::error::Result;
use async_trait::async_trait;

/// Character budget for a composed prompt (system + context + question).
pub const MAX_PROMPT_CHARS: usize = 18_000;

/// Trait for single-shot text completion backends.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete a prompt, returning the generated text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Truncate a string to at most `max_chars` characters, respecting
/// character boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_truncate_respects_multibyte_boundaries() {
        let text = "héllo wörld";
        let cut = truncate_chars(text, 4);
        assert_eq!(cut, "héll");
    }
}

//! Full-transcript translation.
//!
//! When a chat question carries translation intent, the engine
//! short-circuits retrieval and translates the whole transcript instead.

use super::intent::LanguageTarget;
use super::usage::Usage;
use crate::completion::{truncate_chars, CompletionClient};
use crate::config::Prompts;
use crate::error::Result;
use std::collections::HashMap;
use tracing::instrument;

/// Transcript characters handed to the translation prompt.
const MAX_TRANSLATION_INPUT_CHARS: usize = 15_000;

/// Characters of translated text returned in the answer body.
const MAX_TRANSLATION_OUTPUT_CHARS: usize = 60_000;

/// Translated-transcript answer.
#[derive(Debug)]
pub struct Translation {
    /// Answer text, prefixed with the target-language label.
    pub answer: String,
    /// Heuristic usage accounting.
    pub usage: Usage,
}

/// Translate a transcript for a chat answer.
///
/// English targets short-circuit to the original text unchanged. Other
/// targets call the completion collaborator; failures propagate so the
/// caller can report that generation failed.
#[instrument(skip(completion, prompts, text), fields(target = %target.code))]
pub async fn translate_transcript(
    completion: &dyn CompletionClient,
    prompts: &Prompts,
    text: &str,
    target: &LanguageTarget,
    question: &str,
) -> Result<Translation> {
    let translated = if text.is_empty() {
        String::new()
    } else if is_english(&target.code) {
        text.to_string()
    } else {
        let mut vars = HashMap::new();
        vars.insert("language".to_string(), target.name.clone());
        vars.insert(
            "transcript".to_string(),
            truncate_chars(text, MAX_TRANSLATION_INPUT_CHARS).to_string(),
        );
        let prompt = prompts.render_with_custom(&prompts.translation.user, &vars);
        let raw = completion.complete(&prompt).await?;
        // Strip potential code fences or labels.
        raw.trim().replace("```", "").trim().to_string()
    };

    let answer = format!(
        "Transcript translated to {}:\n\n{}",
        target.name,
        truncate_chars(&translated, MAX_TRANSLATION_OUTPUT_CHARS)
    );
    let usage = Usage::estimate(question, &answer, truncate_chars(text, 4_000).len());

    Ok(Translation { answer, usage })
}

fn is_english(code: &str) -> bool {
    matches!(code.to_lowercase().as_str(), "en" | "eng" | "english")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionClient;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCompletion {
        calls: AtomicUsize,
        reply: String,
    }

    impl CountingCompletion {
        fn new(reply: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: reply.to_string(),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for CountingCompletion {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    fn spanish() -> LanguageTarget {
        LanguageTarget {
            code: "es".to_string(),
            name: "Spanish".to_string(),
        }
    }

    fn english() -> LanguageTarget {
        LanguageTarget {
            code: "en".to_string(),
            name: "English".to_string(),
        }
    }

    #[tokio::test]
    async fn test_translation_answer_is_labelled() {
        let completion = CountingCompletion::new("Hola mundo.");
        let result = translate_transcript(
            &completion,
            &Prompts::default(),
            "Hello world.",
            &spanish(),
            "Can you translate the transcript to Spanish?",
        )
        .await
        .unwrap();

        assert!(result.answer.starts_with("Transcript translated to Spanish:"));
        assert!(result.answer.contains("Hola mundo."));
        assert_eq!(completion.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_english_target_short_circuits() {
        let completion = CountingCompletion::new("should not be used");
        let result = translate_transcript(
            &completion,
            &Prompts::default(),
            "Hello world.",
            &english(),
            "transcript in english",
        )
        .await
        .unwrap();

        assert!(result.answer.contains("Hello world."));
        assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_code_fences_stripped() {
        let completion = CountingCompletion::new("```\nHola\n```");
        let result = translate_transcript(
            &completion,
            &Prompts::default(),
            "Hello.",
            &spanish(),
            "translate to spanish",
        )
        .await
        .unwrap();
        assert!(result.answer.ends_with("Hola"));
    }
}

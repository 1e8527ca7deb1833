//! Chat over a media transcript.
//!
//! Three modes share the retrieval and history plumbing but differ in
//! grounding strictness:
//!
//! - **Grounded**: answers only from lexically selected context, with
//!   enforced timestamp citations.
//! - **Agent**: grounded plus short multi-turn memory.
//! - **General**: loosely grounded; a short transcript digest is offered
//!   as optional context and general knowledge is allowed.
//!
//! All modes first check for translation intent and, when detected,
//! short-circuit to a full-transcript translation.

mod history;
mod intent;
mod translate;
mod usage;

pub use history::{ConversationStore, ConversationTurn, Role, ANON_USER, MAX_HISTORY_TURNS};
pub use intent::{IntentClassifier, KeywordIntentClassifier, LanguageTarget};
pub use translate::{translate_transcript, Translation};
pub use usage::Usage;

use crate::completion::{truncate_chars, CompletionClient, MAX_PROMPT_CHARS};
use crate::config::{Prompts, RetrievalSettings};
use crate::error::Result;
use crate::retrieval::LexicalRanker;
use crate::transcript::{format_timestamp, Segment, SegmentStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// History turns included in an agent prompt.
const AGENT_HISTORY_TURNS: usize = 8;

/// History turns included in a general-mode prompt.
const GENERAL_HISTORY_TURNS: usize = 30;

/// History turns echoed back in an agent response.
const AGENT_RESPONSE_HISTORY: usize = 20;

/// Character cap for the agent context block.
const AGENT_CONTEXT_CHARS: usize = 6_000;

/// Character cap per history turn rendered into an agent prompt.
const HISTORY_TURN_CHARS: usize = 500;

/// Segments joined into the general-mode transcript digest.
const DIGEST_SEGMENTS: usize = 150;

/// Character cap for the general-mode transcript digest.
const DIGEST_CHARS: usize = 4_000;

/// Character cap for the synthesized citation trailer.
const TRAILER_CHARS: usize = 120;

/// Chat grounding mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    Grounded,
    Agent,
    General,
}

impl std::str::FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grounded" => Ok(ChatMode::Grounded),
            "agent" => Ok(ChatMode::Agent),
            "general" => Ok(ChatMode::General),
            _ => Err(format!("Unknown chat mode: {}", s)),
        }
    }
}

/// A cited transcript span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub text: String,
}

impl Reference {
    fn from_segment(segment: &Segment) -> Self {
        Self {
            start: segment.start,
            end: segment.end,
            text: segment.text.clone(),
        }
    }
}

/// A chat answer with its supporting material.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated answer.
    pub answer: String,
    /// Transcript spans the answer is grounded in.
    pub references: Vec<Reference>,
    /// Recent conversation history, for modes that keep memory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<ConversationTurn>>,
    /// Estimated usage accounting.
    pub usage: Usage,
}

/// Composes retrieval context, history, and the user question into
/// grounded prompts and post-processes the answers.
pub struct ChatEngine {
    segments: Arc<SegmentStore>,
    history: Arc<ConversationStore>,
    completion: Arc<dyn CompletionClient>,
    intent: Arc<dyn IntentClassifier>,
    lexical: LexicalRanker,
    prompts: Prompts,
    retrieval: RetrievalSettings,
}

impl ChatEngine {
    /// Create a chat engine from its collaborators.
    pub fn new(
        segments: Arc<SegmentStore>,
        history: Arc<ConversationStore>,
        completion: Arc<dyn CompletionClient>,
        intent: Arc<dyn IntentClassifier>,
        prompts: Prompts,
        retrieval: RetrievalSettings,
    ) -> Self {
        Self {
            segments,
            history,
            completion,
            intent,
            lexical: LexicalRanker::new(),
            prompts,
            retrieval,
        }
    }

    /// Answer a question about a media item in the given mode.
    #[instrument(skip(self, question), fields(media_id = %media_id, mode = ?mode))]
    pub async fn chat(
        &self,
        media_id: &str,
        question: &str,
        mode: ChatMode,
        user_id: Option<&str>,
    ) -> Result<ChatResponse> {
        info!("Chat question in {:?} mode", mode);

        if let Some(target) = self.intent.detect_translation(question) {
            debug!("Translation intent detected: {}", target.code);
            return self.translate(media_id, question, &target).await;
        }

        match mode {
            ChatMode::Grounded => self.grounded(media_id, question).await,
            ChatMode::Agent => self.agent(media_id, question, user_id).await,
            ChatMode::General => self.general(media_id, question, user_id).await,
        }
    }

    /// Stored history for a conversation key.
    pub async fn list_history(
        &self,
        media_id: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<ConversationTurn>> {
        self.history.load(media_id, user_id).await
    }

    /// Delete a conversation's history. Idempotent.
    pub async fn clear_history(&self, media_id: &str, user_id: Option<&str>) -> Result<bool> {
        self.history.clear(media_id, user_id).await
    }

    async fn translate(
        &self,
        media_id: &str,
        question: &str,
        target: &LanguageTarget,
    ) -> Result<ChatResponse> {
        let record = self.segments.load(media_id).await?;
        let text = record.full_text();
        let translation = translate_transcript(
            self.completion.as_ref(),
            &self.prompts,
            &text,
            target,
            question,
        )
        .await?;
        Ok(ChatResponse {
            answer: translation.answer,
            references: Vec::new(),
            history: None,
            usage: translation.usage,
        })
    }

    async fn grounded(&self, media_id: &str, question: &str) -> Result<ChatResponse> {
        let record = self.segments.load(media_id).await?;
        let segments = self.segments.retrieval_segments(&record);

        let top = self.select_context(&segments, question, self.retrieval.context_segments as usize, 4);
        let context = format_context(&top);

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), context.clone());
        let prompt = self.prompts.render_with_custom(&self.prompts.chat.grounded, &vars);

        let raw = self
            .completion
            .complete(truncate_chars(&prompt, MAX_PROMPT_CHARS))
            .await?;

        let references: Vec<Reference> = top.iter().take(5).map(|s| Reference::from_segment(s)).collect();
        let answer = enforce_citations(&raw, &references);
        let usage = Usage::estimate(question, &answer, 0);

        Ok(ChatResponse {
            answer,
            references,
            history: None,
            usage,
        })
    }

    async fn agent(
        &self,
        media_id: &str,
        question: &str,
        user_id: Option<&str>,
    ) -> Result<ChatResponse> {
        let record = self.segments.load(media_id).await?;
        let segments = self.segments.retrieval_segments(&record);
        let stored = self.history.load(media_id, user_id).await?;
        let trimmed: Vec<&ConversationTurn> =
            stored.iter().rev().take(AGENT_HISTORY_TURNS).rev().collect();

        let top = self.select_context(
            &segments,
            question,
            self.retrieval.agent_context_segments as usize,
            5,
        );
        let context = truncate_chars(&format_context(&top), AGENT_CONTEXT_CHARS).to_string();
        let convo = render_history(&trimmed, true);

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), context.clone());
        vars.insert("history".to_string(), convo.clone());
        let prompt = self.prompts.render_with_custom(&self.prompts.chat.agent, &vars);

        let raw = self
            .completion
            .complete(truncate_chars(&prompt, MAX_PROMPT_CHARS))
            .await?;

        let references: Vec<Reference> = top.iter().take(6).map(|s| Reference::from_segment(s)).collect();

        // History is persisted only after the completion returns, so an
        // abandoned call leaves no side effects to roll back.
        let updated = self
            .history
            .append(
                media_id,
                user_id,
                vec![
                    ConversationTurn::user(question),
                    ConversationTurn::assistant(&raw),
                ],
            )
            .await?;

        let recent: Vec<ConversationTurn> = updated
            .iter()
            .rev()
            .take(AGENT_RESPONSE_HISTORY)
            .rev()
            .cloned()
            .collect();
        let usage = Usage::estimate(question, &raw, context.len() + convo.len());

        Ok(ChatResponse {
            answer: raw,
            references,
            history: Some(recent),
            usage,
        })
    }

    async fn general(
        &self,
        media_id: &str,
        question: &str,
        user_id: Option<&str>,
    ) -> Result<ChatResponse> {
        // General mode tolerates a missing transcript; the digest is
        // simply empty.
        let digest = match self.segments.try_load(media_id).await? {
            Some(record) => {
                let joined = record
                    .segments
                    .iter()
                    .take(DIGEST_SEGMENTS)
                    .map(|s| s.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                truncate_chars(&joined, DIGEST_CHARS).to_string()
            }
            None => String::new(),
        };

        let stored = self.history.load(media_id, user_id).await?;
        let trimmed: Vec<&ConversationTurn> =
            stored.iter().rev().take(GENERAL_HISTORY_TURNS).rev().collect();
        let convo = render_history(&trimmed, false);

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("digest".to_string(), digest.clone());
        vars.insert("history".to_string(), convo.clone());
        let prompt = self.prompts.render_with_custom(&self.prompts.chat.general, &vars);

        let raw = self
            .completion
            .complete(truncate_chars(&prompt, MAX_PROMPT_CHARS))
            .await?;

        let updated = self
            .history
            .append(
                media_id,
                user_id,
                vec![
                    ConversationTurn::user(question),
                    ConversationTurn::assistant(&raw),
                ],
            )
            .await?;

        let recent: Vec<ConversationTurn> = updated
            .iter()
            .rev()
            .take(GENERAL_HISTORY_TURNS)
            .rev()
            .cloned()
            .collect();
        let usage = Usage::estimate(question, &raw, digest.len() + convo.len());

        Ok(ChatResponse {
            answer: raw,
            references: Vec::new(),
            history: Some(recent),
            usage,
        })
    }

    /// Lexical top-k context, falling back to the first `fallback_count`
    /// segments when nothing matches.
    fn select_context<'a>(
        &self,
        segments: &'a [Segment],
        question: &str,
        k: usize,
        fallback_count: usize,
    ) -> Vec<&'a Segment> {
        let top = self.lexical.top_segments(segments, question, k);
        if top.is_empty() {
            segments.iter().take(fallback_count).collect()
        } else {
            top
        }
    }
}

/// Render segments as "[start-end] text" context lines.
fn format_context(segments: &[&Segment]) -> String {
    segments
        .iter()
        .map(|s| {
            format!(
                "[{:.1}-{:.1}] {}",
                s.start.unwrap_or(0.0),
                s.end.unwrap_or(0.0),
                s.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render history turns for a prompt, one line per turn.
fn render_history(turns: &[&ConversationTurn], title_case: bool) -> String {
    turns
        .iter()
        .map(|t| {
            let role = if title_case { t.role.title() } else { t.role.label() };
            format!("{}: {}", role, truncate_chars(&t.content, HISTORY_TURN_CHARS))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Append a synthesized citation trailer when the model produced none.
fn enforce_citations(answer: &str, references: &[Reference]) -> String {
    if answer.contains('[') || references.is_empty() {
        return answer.to_string();
    }

    let joined = references
        .iter()
        .take(5)
        .filter_map(|r| r.start.map(|s| format!("[{}]", format_timestamp(s))))
        .collect::<Vec<_>>()
        .join(", ");
    let trailer = truncate_chars(&joined, TRAILER_CHARS);
    if trailer.is_empty() {
        return answer.to_string();
    }

    format!("{}\n\nReferenced timestamps: {}", answer.trim(), trailer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EkkoError;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::transcript::TranscriptRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockCompletion {
        reply: String,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl MockCompletion {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl CompletionClient for MockCompletion {
        async fn complete(&self, prompt: &str) -> crate::error::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    async fn seed_transcript(store: &MemoryStore, media_id: &str, text: &str, segments: Vec<Segment>) {
        let record = TranscriptRecord {
            media_id: media_id.to_string(),
            language: None,
            text: text.to_string(),
            segments,
        };
        let bytes = serde_json::to_vec(&record).unwrap();
        store
            .put(&format!("{}_transcript", media_id), &bytes)
            .await
            .unwrap();
    }

    fn engine(store: Arc<MemoryStore>, completion: Arc<MockCompletion>) -> ChatEngine {
        ChatEngine::new(
            Arc::new(SegmentStore::new(store.clone())),
            Arc::new(ConversationStore::new(store)),
            completion,
            Arc::new(KeywordIntentClassifier::new()),
            Prompts::default(),
            RetrievalSettings::default(),
        )
    }

    fn cat_dog_segments() -> Vec<Segment> {
        vec![
            Segment::new(0.0, 5.0, "the cat sat"),
            Segment::new(5.0, 10.0, "the dog ran"),
        ]
    }

    #[tokio::test]
    async fn test_grounded_uses_matching_context() {
        let store = Arc::new(MemoryStore::new());
        seed_transcript(&store, "m", "", cat_dog_segments()).await;
        let completion = MockCompletion::new("The dog ran [00:05].");
        let engine = engine(store, completion.clone());

        let response = engine
            .chat("m", "what did the dog do", ChatMode::Grounded, None)
            .await
            .unwrap();

        assert_eq!(response.answer, "The dog ran [00:05].");
        // Both segments match "the"; the dog segment scores higher.
        assert_eq!(response.references.len(), 2);
        assert_eq!(response.references[0].text, "the dog ran");
        assert!(completion.last_prompt().contains("[5.0-10.0] the dog ran"));
        assert!(response.history.is_none());
    }

    #[tokio::test]
    async fn test_grounded_appends_citation_trailer() {
        let store = Arc::new(MemoryStore::new());
        seed_transcript(&store, "m", "", cat_dog_segments()).await;
        let completion = MockCompletion::new("The dog ran fast.");
        let engine = engine(store, completion);

        let response = engine
            .chat("m", "what did the dog do", ChatMode::Grounded, None)
            .await
            .unwrap();

        assert!(response.answer.contains("Referenced timestamps: [00:05]"));
    }

    #[tokio::test]
    async fn test_grounded_no_match_falls_back_to_leading_segments() {
        let store = Arc::new(MemoryStore::new());
        seed_transcript(&store, "m", "", cat_dog_segments()).await;
        let completion = MockCompletion::new("Not covered.");
        let engine = engine(store, completion.clone());

        let response = engine
            .chat("m", "quantum flux", ChatMode::Grounded, None)
            .await
            .unwrap();

        // Both segments land in context and the references.
        assert!(completion.last_prompt().contains("the cat sat"));
        assert_eq!(response.references.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_transcript_propagates() {
        let store = Arc::new(MemoryStore::new());
        let completion = MockCompletion::new("unused");
        let engine = engine(store, completion);

        let err = engine
            .chat("nope", "anything", ChatMode::Grounded, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EkkoError::TranscriptNotFound(_)));
    }

    #[tokio::test]
    async fn test_translation_short_circuits_retrieval() {
        let store = Arc::new(MemoryStore::new());
        seed_transcript(&store, "m", "Hello world.", Vec::new()).await;
        let completion = MockCompletion::new("Hola mundo.");
        let engine = engine(store, completion.clone());

        let response = engine
            .chat(
                "m",
                "Can you translate the transcript to Spanish?",
                ChatMode::Grounded,
                None,
            )
            .await
            .unwrap();

        assert!(response.answer.starts_with("Transcript translated to Spanish:"));
        assert!(response.references.is_empty());
        // Exactly one completion call: the translation itself.
        assert_eq!(completion.calls(), 1);
        assert!(completion.last_prompt().contains("Hello world."));
    }

    #[tokio::test]
    async fn test_agent_persists_turn_pair() {
        let store = Arc::new(MemoryStore::new());
        seed_transcript(&store, "m", "", cat_dog_segments()).await;
        let completion = MockCompletion::new("It ran [00:05].");
        let engine = engine(store.clone(), completion);

        let response = engine
            .chat("m", "what did the dog do", ChatMode::Agent, Some("u1"))
            .await
            .unwrap();

        let history = response.history.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].content, "It ran [00:05].");

        let stored = engine.list_history("m", Some("u1")).await.unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn test_agent_includes_prior_turns_in_prompt() {
        let store = Arc::new(MemoryStore::new());
        seed_transcript(&store, "m", "", cat_dog_segments()).await;
        let completion = MockCompletion::new("Still the dog.");
        let engine = engine(store, completion.clone());

        engine
            .chat("m", "what did the dog do", ChatMode::Agent, None)
            .await
            .unwrap();
        engine
            .chat("m", "and the dog again?", ChatMode::Agent, None)
            .await
            .unwrap();

        let prompt = completion.last_prompt();
        assert!(prompt.contains("User: what did the dog do"));
        assert!(prompt.contains("Assistant: Still the dog."));
    }

    #[tokio::test]
    async fn test_general_tolerates_missing_transcript() {
        let store = Arc::new(MemoryStore::new());
        let completion = MockCompletion::new("General answer.");
        let engine = engine(store, completion);

        let response = engine
            .chat("absent", "tell me about rust", ChatMode::General, None)
            .await
            .unwrap();

        assert_eq!(response.answer, "General answer.");
        assert!(response.references.is_empty());
        assert_eq!(response.history.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_general_includes_digest() {
        let store = Arc::new(MemoryStore::new());
        seed_transcript(&store, "m", "", cat_dog_segments()).await;
        let completion = MockCompletion::new("ok");
        let engine = engine(store, completion.clone());

        engine
            .chat("m", "summarize things", ChatMode::General, None)
            .await
            .unwrap();

        assert!(completion.last_prompt().contains("the cat sat the dog ran"));
    }

    #[tokio::test]
    async fn test_clear_history_roundtrip() {
        let store = Arc::new(MemoryStore::new());
        seed_transcript(&store, "m", "", cat_dog_segments()).await;
        let completion = MockCompletion::new("answer");
        let engine = engine(store, completion);

        assert!(engine.clear_history("m", None).await.unwrap());
        engine
            .chat("m", "what did the dog do", ChatMode::Agent, None)
            .await
            .unwrap();
        assert_eq!(engine.list_history("m", None).await.unwrap().len(), 2);
        assert!(engine.clear_history("m", None).await.unwrap());
        assert!(engine.list_history("m", None).await.unwrap().is_empty());
    }

    #[test]
    fn test_enforce_citations_no_op_when_bracketed() {
        let refs = vec![Reference {
            start: Some(5.0),
            end: Some(10.0),
            text: "x".to_string(),
        }];
        assert_eq!(enforce_citations("See [00:05].", &refs), "See [00:05].");
        assert_eq!(enforce_citations("plain", &[]), "plain");
    }

    #[test]
    fn test_enforce_citations_caps_trailer() {
        let refs: Vec<Reference> = (0..5)
            .map(|i| Reference {
                start: Some(i as f64 * 60.0),
                end: None,
                text: String::new(),
            })
            .collect();
        let out = enforce_citations("no brackets here", &refs);
        let trailer = out.split("Referenced timestamps: ").nth(1).unwrap();
        assert!(trailer.chars().count() <= TRAILER_CHARS);
        assert!(trailer.starts_with("[00:00], [01:00]"));
    }

    #[test]
    fn test_chat_mode_parse() {
        assert_eq!("agent".parse::<ChatMode>().unwrap(), ChatMode::Agent);
        assert!("other".parse::<ChatMode>().is_err());
    }
}

//! Structured transcript summaries.
//!
//! One summary per media item, cached in the storage port. The model is
//! asked for strict JSON but its output is treated as hostile: fences and
//! prose around the JSON object are tolerated, alternate key spellings
//! are normalized, and unparseable output degrades to a deterministic
//! excerpt of the transcript instead of failing the request.

use crate::completion::{truncate_chars, CompletionClient, MAX_PROMPT_CHARS};
use crate::config::Prompts;
use crate::error::Result;
use crate::storage::{self, KeyValueStore};
use crate::transcript::SegmentStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Transcript characters included in the summary prompt.
const MAX_SUMMARY_INPUT_CHARS: usize = 15_000;

/// Character cap for the fallback short summary.
const FALLBACK_SHORT_CHARS: usize = 300;

/// Character cap for the fallback detailed summary.
const FALLBACK_DETAILED_CHARS: usize = 4_000;

/// A structured media summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub summary_short: String,
    pub summary_detailed: String,
    pub key_highlights: Vec<String>,
    pub sentiment: String,
    pub action_points: Vec<String>,
}

/// Generates and caches structured summaries.
pub struct Summarizer {
    segments: Arc<SegmentStore>,
    store: Arc<dyn KeyValueStore>,
    completion: Arc<dyn CompletionClient>,
    prompts: Prompts,
}

impl Summarizer {
    /// Create a summarizer from its collaborators.
    pub fn new(
        segments: Arc<SegmentStore>,
        store: Arc<dyn KeyValueStore>,
        completion: Arc<dyn CompletionClient>,
        prompts: Prompts,
    ) -> Self {
        Self {
            segments,
            store,
            completion,
            prompts,
        }
    }

    fn cache_key(media_id: &str) -> String {
        format!("{}_summary", media_id)
    }

    /// Summarize a media item, serving a cached result when present.
    /// `force` regenerates and overwrites the cache.
    #[instrument(skip(self), fields(media_id = %media_id))]
    pub async fn summarize(&self, media_id: &str, force: bool) -> Result<Summary> {
        let key = Self::cache_key(media_id);
        if !force {
            if let Some(cached) = storage::get_json::<Summary>(self.store.as_ref(), &key).await? {
                debug!("Serving cached summary");
                return Ok(cached);
            }
        }

        let record = self.segments.load(media_id).await?;
        let text = record.full_text();

        let prompt = format!(
            "{}\n\nTranscript:\n{}",
            self.prompts.summary.system,
            truncate_chars(&text, MAX_SUMMARY_INPUT_CHARS)
        );
        let raw = self
            .completion
            .complete(truncate_chars(&prompt, MAX_PROMPT_CHARS))
            .await?;

        let summary = match parse_summary(&raw) {
            Some(summary) => summary,
            None => {
                warn!("Summary output was not parseable JSON, using excerpt fallback");
                fallback_summary(&text)
            }
        };

        storage::put_json(self.store.as_ref(), &key, &summary).await?;
        info!("Summary generated and cached");
        Ok(summary)
    }

    /// Drop a cached summary so the next request regenerates it.
    pub async fn invalidate(&self, media_id: &str) -> Result<bool> {
        self.store.delete(&Self::cache_key(media_id)).await
    }
}

/// Parse a model's summary output into a [`Summary`], tolerating fences,
/// surrounding prose, and alternate key names.
fn parse_summary(raw: &str) -> Option<Summary> {
    let value = extract_json(raw)?;
    Some(Summary {
        summary_short: string_field(&value, &["summary_short", "short"]),
        summary_detailed: string_field(&value, &["summary_detailed", "detailed", "summary"]),
        key_highlights: list_field(&value, &["key_highlights", "highlights"]),
        sentiment: {
            let sentiment = string_field(&value, &["sentiment", "tone"]);
            if sentiment.is_empty() {
                "neutral".to_string()
            } else {
                sentiment
            }
        },
        action_points: list_field(&value, &["action_points", "actionPoints"]),
    })
}

/// Locate and parse the JSON object inside possibly noisy model output.
fn extract_json(raw: &str) -> Option<Value> {
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        if value.is_object() {
            return Some(value);
        }
    }

    // Fall back to the outermost brace-delimited span.
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&cleaned[start..=end])
        .ok()
        .filter(Value::is_object)
}

fn string_field(value: &Value, keys: &[&str]) -> String {
    for key in keys {
        if let Some(s) = value.get(key).and_then(Value::as_str) {
            return s.trim().to_string();
        }
    }
    String::new()
}

fn list_field(value: &Value, keys: &[&str]) -> Vec<String> {
    for key in keys {
        if let Some(items) = value.get(key).and_then(Value::as_array) {
            return items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }
    Vec::new()
}

/// Deterministic excerpt summary used when the model output is unusable.
fn fallback_summary(text: &str) -> Summary {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");
    Summary {
        summary_short: truncate_chars(&cleaned, FALLBACK_SHORT_CHARS).to_string(),
        summary_detailed: truncate_chars(&cleaned, FALLBACK_DETAILED_CHARS).to_string(),
        key_highlights: Vec::new(),
        sentiment: "neutral".to_string(),
        action_points: Vec::new(),
    }
}

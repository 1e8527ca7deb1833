//! Transcript loading and pseudo-segmentation.

use super::{Segment, TranscriptRecord};
use crate::error::{EkkoError, Result};
use crate::storage::{self, KeyValueStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Maximum number of synthetic segments created from raw text.
const MAX_SYNTHETIC_SEGMENTS: usize = 120;

/// Duration in seconds assigned to each synthetic segment.
const SYNTHETIC_SEGMENT_SECONDS: f64 = 5.0;

/// Loads transcript records and prepares their segments for retrieval.
pub struct SegmentStore {
    store: Arc<dyn KeyValueStore>,
}

impl SegmentStore {
    /// Create a segment store backed by the given storage port.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn transcript_key(media_id: &str) -> String {
        format!("{}_transcript", media_id)
    }

    /// Load the transcript record for a media item.
    #[instrument(skip(self))]
    pub async fn load(&self, media_id: &str) -> Result<TranscriptRecord> {
        let key = Self::transcript_key(media_id);
        match storage::get_json::<TranscriptRecord>(self.store.as_ref(), &key).await? {
            Some(mut record) => {
                record.media_id = media_id.to_string();
                Ok(record)
            }
            None => Err(EkkoError::TranscriptNotFound(media_id.to_string())),
        }
    }

    /// Load the transcript record if present, without treating absence as
    /// an error. Used by loosely grounded chat, which tolerates missing
    /// transcripts.
    pub async fn try_load(&self, media_id: &str) -> Result<Option<TranscriptRecord>> {
        match self.load(media_id).await {
            Ok(record) => Ok(Some(record)),
            Err(EkkoError::TranscriptNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Segments suitable for retrieval and citation.
    ///
    /// When the record has no segments, or none of them carries a usable
    /// start time, sentences from the raw text are given synthetic
    /// 5-second windows. The synthesized segments live in memory only and
    /// are never written back to the record.
    pub fn retrieval_segments(&self, record: &TranscriptRecord) -> Vec<Segment> {
        let timeless = record.segments.is_empty()
            || record.segments.iter().all(|s| !s.has_timing());

        if !timeless {
            return record.segments.clone();
        }

        let raw = record.full_text();
        let raw = raw.trim();
        if raw.is_empty() {
            return record.segments.clone();
        }

        let synthetic: Vec<Segment> = split_sentences(raw)
            .into_iter()
            .take(MAX_SYNTHETIC_SEGMENTS)
            .enumerate()
            .map(|(i, sentence)| {
                let start = i as f64 * SYNTHETIC_SEGMENT_SECONDS;
                Segment::new(start, start + SYNTHETIC_SEGMENT_SECONDS, sentence)
            })
            .collect();

        if synthetic.is_empty() {
            record.segments.clone()
        } else {
            debug!("Synthesized {} segments from raw text", synthetic.len());
            synthetic
        }
    }
}

/// Split text into sentences at `.`, `!`, or `?` followed by whitespace.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            if chars.peek().is_none_or(|next| next.is_whitespace()) {
                let sentence = current.trim().to_string();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                current.clear();
                // Consume the boundary whitespace.
                while chars.peek().is_some_and(|next| next.is_whitespace()) {
                    chars.next();
                }
            }
        }
    }

    let tail = current.trim().to_string();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

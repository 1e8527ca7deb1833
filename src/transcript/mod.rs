//! Transcript records and segment access for Ekko.
//!
//! Transcripts are produced by an external transcription pipeline and are
//! read-only here. Many source transcripts (user-pasted text in particular)
//! carry no timing information, so [`SegmentStore`] synthesizes a time axis
//! when needed for downstream citation logic.

mod store;

pub use store::SegmentStore;

use serde::{Deserialize, Serialize};

/// A time-bounded span of transcript text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    /// Start time in seconds.
    pub start: Option<f64>,
    /// End time in seconds.
    pub end: Option<f64>,
    /// Transcribed text content.
    pub text: String,
}

impl Segment {
    /// Create a new segment with known timing.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            text: text.into(),
        }
    }

    /// Whether the segment carries a usable start time.
    pub fn has_timing(&self) -> bool {
        matches!(self.start, Some(s) if s != 0.0)
    }
}

/// A complete transcript for one media item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptRecord {
    /// Opaque media identifier.
    pub media_id: String,
    /// Detected language (if available).
    #[serde(default)]
    pub language: Option<String>,
    /// Full transcript text.
    #[serde(default)]
    pub text: String,
    /// Individual transcript segments with timestamps.
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl TranscriptRecord {
    /// Full text, falling back to concatenated segments when the text
    /// field is empty.
    pub fn full_text(&self) -> String {
        if !self.text.trim().is_empty() {
            return self.text.clone();
        }
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

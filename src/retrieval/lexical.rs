//! Term-frequency overlap ranking.
//!
//! The simplest, always-available retrieval tier. The chat engine also
//! uses it directly for prompt context selection.

use super::RetrievalResult;
use crate::transcript::Segment;

/// Lexical overlap ranker.
pub struct LexicalRanker;

impl LexicalRanker {
    /// Create a new lexical ranker.
    pub fn new() -> Self {
        Self
    }

    /// Rank segments against a query by raw substring-count overlap.
    ///
    /// Query tokens are lowercased and tokens of length <= 2 dropped. The
    /// score is the sum of substring occurrences of each remaining term in
    /// the lowercased segment text. Substring counting is intentionally
    /// permissive: short terms can match inside longer words. Zero-score
    /// segments are discarded; ties keep original segment order.
    pub fn rank(&self, segments: &[Segment], query: &str, k: usize) -> Vec<RetrievalResult> {
        self.scored(segments, query)
            .into_iter()
            .take(k)
            .map(|(score, seg)| RetrievalResult {
                text: seg.text.clone(),
                start: seg.start,
                end: seg.end,
                score: score as f32,
            })
            .collect()
    }

    /// The segments behind the top-k results, for context assembly.
    pub fn top_segments<'a>(
        &self,
        segments: &'a [Segment],
        query: &str,
        k: usize,
    ) -> Vec<&'a Segment> {
        self.scored(segments, query)
            .into_iter()
            .take(k)
            .map(|(_, seg)| seg)
            .collect()
    }

    /// Matching segments with their scores, descending, stable on ties.
    fn scored<'a>(&self, segments: &'a [Segment], query: &str) -> Vec<(usize, &'a Segment)> {
        let terms = query_terms(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, &Segment)> = segments
            .iter()
            .filter_map(|seg| {
                let text = seg.text.to_lowercase();
                let score: usize = terms.iter().map(|t| text.matches(t.as_str()).count()).sum();
                (score > 0).then_some((score, seg))
            })
            .collect();

        // sort_by is stable, so equal scores preserve segment order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
    }
}

impl Default for LexicalRanker {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercased whitespace tokens longer than two characters.
fn query_terms(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|t| t.chars().count() > 2)
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments() -> Vec<Segment> {
        vec![
            Segment::new(0.0, 5.0, "the cat sat"),
            Segment::new(5.0, 10.0, "the dog ran"),
        ]
    }

    #[test]
    fn test_single_match() {
        let ranker = LexicalRanker::new();
        let results = ranker.rank(&segments(), "dog", 5);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "the dog ran");
        assert!(results[0].score >= 1.0);
        assert_eq!(results[0].start, Some(5.0));
    }

    #[test]
    fn test_zero_score_discarded() {
        let ranker = LexicalRanker::new();
        let results = ranker.rank(&segments(), "elephant", 5);
        assert!(results.is_empty());
    }

    #[test]
    fn test_short_tokens_dropped() {
        let ranker = LexicalRanker::new();
        // All tokens are two characters or fewer, so no terms survive.
        let results = ranker.rank(&segments(), "a an to", 5);
        assert!(results.is_empty());
    }

    #[test]
    fn test_short_tokens_counted_by_characters() {
        let ranker = LexicalRanker::new();
        let segs = vec![Segment::new(0.0, 5.0, "ça va très bien")];
        // "ça" is two characters (three bytes) and must be dropped.
        assert!(ranker.rank(&segs, "ça", 5).is_empty());
        // "très" survives the length filter.
        assert_eq!(ranker.rank(&segs, "très", 5).len(), 1);
    }

    #[test]
    fn test_descending_with_stable_ties() {
        let ranker = LexicalRanker::new();
        let segs = vec![
            Segment::new(0.0, 5.0, "dog"),
            Segment::new(5.0, 10.0, "dog dog dog"),
            Segment::new(10.0, 15.0, "dog bone"),
            Segment::new(15.0, 20.0, "another dog"),
        ];
        let results = ranker.rank(&segs, "dog", 10);
        assert_eq!(results[0].text, "dog dog dog");
        // Three single-occurrence ties keep original order.
        assert_eq!(results[1].text, "dog");
        assert_eq!(results[2].text, "dog bone");
        assert_eq!(results[3].text, "another dog");
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_substring_counting_is_permissive() {
        let ranker = LexicalRanker::new();
        let segs = vec![Segment::new(0.0, 5.0, "catalog of catastrophes")];
        let results = ranker.rank(&segs, "cat", 5);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, 2.0);
    }

    #[test]
    fn test_k_caps_results() {
        let ranker = LexicalRanker::new();
        let segs: Vec<Segment> = (0..10)
            .map(|i| Segment::new(i as f64, i as f64 + 1.0, format!("dog {}", i)))
            .collect();
        assert_eq!(ranker.rank(&segs, "dog", 3).len(), 3);
    }

    #[test]
    fn test_empty_segments() {
        let ranker = LexicalRanker::new();
        assert!(ranker.rank(&[], "dog", 5).is_empty());
    }

    #[test]
    fn test_top_segments_matches_rank_order() {
        let ranker = LexicalRanker::new();
        let segs = segments();
        let top = ranker.top_segments(&segs, "dog", 5);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].text, "the dog ran");
    }
}

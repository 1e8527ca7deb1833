//! BM25-Okapi ranking.
//!
//! Probabilistic middle tier of the fallback chain: used when the vector
//! index is unavailable. Tokenization is whitespace only with no
//! lowercasing or stemming beyond what the text already carries.

use super::RetrievalResult;
use crate::transcript::Segment;

const K1: f64 = 1.5;
const B: f64 = 0.75;
/// Negative IDF values are floored at `EPSILON` times the mean IDF, the
/// standard Okapi adjustment for terms present in most documents.
const EPSILON: f64 = 0.25;

/// BM25-Okapi ranker over a segment corpus.
pub struct Bm25Ranker;

impl Bm25Ranker {
    /// Create a new BM25 ranker.
    pub fn new() -> Self {
        Self
    }

    /// Rank segments against a query, best first.
    ///
    /// All segments are returned up to `k`, zero scores included; an
    /// empty or all-blank corpus yields an empty sequence.
    pub fn rank(&self, segments: &[Segment], query: &str, k: usize) -> Vec<RetrievalResult> {
        let docs: Vec<Vec<&str>> = segments
            .iter()
            .map(|s| s.text.split_whitespace().collect())
            .collect();
        if docs.iter().all(|d| d.is_empty()) {
            return Vec::new();
        }

        let corpus = Corpus::new(&docs);
        let query_tokens: Vec<&str> = query.split_whitespace().collect();

        let mut scored: Vec<(f64, &Segment)> = segments
            .iter()
            .enumerate()
            .map(|(i, seg)| (corpus.score(i, &query_tokens), seg))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
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
}

impl Default for Bm25Ranker {
    fn default() -> Self {
        Self::new()
    }
}

/// Precomputed corpus statistics for BM25 scoring.
struct Corpus<'a> {
    term_freqs: Vec<std::collections::HashMap<&'a str, usize>>,
    doc_lens: Vec<usize>,
    avg_doc_len: f64,
    idf: std::collections::HashMap<&'a str, f64>,
}

impl<'a> Corpus<'a> {
    fn new(docs: &[Vec<&'a str>]) -> Self {
        use std::collections::HashMap;

        let n = docs.len();
        let mut term_freqs = Vec::with_capacity(n);
        let mut doc_lens = Vec::with_capacity(n);
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();

        for doc in docs {
            let mut tf: HashMap<&str, usize> = HashMap::new();
            for token in doc {
                *tf.entry(token).or_insert(0) += 1;
            }
            for term in tf.keys() {
                *doc_freq.entry(*term).or_insert(0) += 1;
            }
            doc_lens.push(doc.len());
            term_freqs.push(tf);
        }

        let total_len: usize = doc_lens.iter().sum();
        let avg_doc_len = if n > 0 { total_len as f64 / n as f64 } else { 0.0 };

        // Okapi IDF with the negative-value floor applied afterwards.
        let mut idf: HashMap<&str, f64> = HashMap::new();
        let mut idf_sum = 0.0;
        let mut negative: Vec<&str> = Vec::new();
        for (term, df) in &doc_freq {
            let value = ((n as f64 - *df as f64 + 0.5) / (*df as f64 + 0.5)).ln();
            idf_sum += value;
            if value < 0.0 {
                negative.push(*term);
            }
            idf.insert(*term, value);
        }
        if !idf.is_empty() {
            let floor = EPSILON * (idf_sum / idf.len() as f64);
            for term in negative {
                idf.insert(term, floor);
            }
        }

        Self {
            term_freqs,
            doc_lens,
            avg_doc_len,
            idf,
        }
    }

    fn score(&self, doc: usize, query_tokens: &[&str]) -> f64 {
        let doc_len = self.doc_lens[doc] as f64;
        let tf = &self.term_freqs[doc];
        query_tokens
            .iter()
            .map(|token| {
                let freq = *tf.get(token).unwrap_or(&0) as f64;
                if freq == 0.0 {
                    return 0.0;
                }
                let idf = *self.idf.get(token).unwrap_or(&0.0);
                let denom = freq + K1 * (1.0 - B + B * doc_len / self.avg_doc_len);
                idf * (freq * (K1 + 1.0)) / denom
            })
            .sum()
    }
}

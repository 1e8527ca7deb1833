//! Heuristic token and cost accounting.
//!
//! Every chat response carries an estimated usage record. The numbers are
//! a crude word-count approximation, not billing-grade accounting.

use serde::{Deserialize, Serialize};

/// Estimated token usage for one chat exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    /// Placeholder cost figure; real pricing is not embedded.
    pub cost_estimate_usd: f64,
}

impl Usage {
    /// Estimate usage for a question/answer pair, with `extra_context`
    /// counting the characters of context included in the prompt.
    pub fn estimate(question: &str, completion: &str, extra_context: usize) -> Self {
        let prompt_tokens = estimate_tokens(question) + (extra_context as u64 / 4);
        let completion_tokens = estimate_tokens(completion);
        let total_tokens = prompt_tokens + completion_tokens;
        let cost_estimate_usd = round6(total_tokens as f64 / 1_000_000.0);
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
            cost_estimate_usd,
        }
    }
}

/// Crude approximation: tokens ~ words * 1.3.
fn estimate_tokens(text: &str) -> u64 {
    let words = text.split_whitespace().count();
    (words as f64 * 1.3) as u64
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("one two three"), 3); // 3 * 1.3 = 3.9 -> 3
        assert_eq!(estimate_tokens("a b c d e f g h i j"), 13);
    }

    #[test]
    fn test_usage_totals() {
        let usage = Usage::estimate("what about dogs", "dogs are discussed at length here", 400);
        assert_eq!(usage.prompt_tokens, 3 + 100);
        assert_eq!(usage.completion_tokens, 7); // 6 words * 1.3 = 7.8 -> 7
        assert_eq!(usage.total_tokens, usage.prompt_tokens + usage.completion_tokens);
        assert!(usage.cost_estimate_usd > 0.0);
    }
}

//! Translation-intent detection.
//!
//! A pluggable classifier seam: the default implementation is a keyword
//! heuristic over free text, and can later be replaced by a proper intent
//! model without touching the chat engine's branching.

use regex::Regex;

/// Language names recognized in translation requests, with their codes.
const LANGUAGES: &[(&str, &str)] = &[
    ("hindi", "hi"),
    ("spanish", "es"),
    ("french", "fr"),
    ("german", "de"),
    ("chinese", "zh"),
    ("mandarin", "zh"),
    ("japanese", "ja"),
    ("korean", "ko"),
    ("italian", "it"),
    ("portuguese", "pt"),
    ("russian", "ru"),
    ("arabic", "ar"),
    ("bengali", "bn"),
    ("marathi", "mr"),
    ("tamil", "ta"),
    ("telugu", "te"),
    ("urdu", "ur"),
    ("indonesian", "id"),
    ("turkish", "tr"),
    ("polish", "pl"),
    ("dutch", "nl"),
    ("thai", "th"),
    ("vietnamese", "vi"),
];

/// Phrases that mark a question as a translation/transcript request.
const TRIGGER_PHRASES: &[&str] = &[
    "translate",
    "translation",
    "transcript in",
    "give me the transcript",
    "show transcript",
    "provide transcript",
];

/// A detected translation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTarget {
    /// ISO 639-1 code, e.g. "es".
    pub code: String,
    /// Title-cased display name, e.g. "Spanish".
    pub name: String,
}

/// Trait for translation-intent classification.
pub trait IntentClassifier: Send + Sync {
    /// Return the target language if the question asks for a transcript
    /// translation, else None.
    fn detect_translation(&self, question: &str) -> Option<LanguageTarget>;
}

/// Keyword and regex based intent classifier.
pub struct KeywordIntentClassifier {
    language_pattern: Regex,
}

impl KeywordIntentClassifier {
    /// Build the classifier with its fixed language table.
    pub fn new() -> Self {
        let names: Vec<&str> = LANGUAGES.iter().map(|(name, _)| *name).collect();
        let pattern = format!(r"(?i)(?:(?:in|to|into)\s+)?({})\b", names.join("|"));
        Self {
            // The pattern is assembled from a fixed table; it always parses.
            language_pattern: Regex::new(&pattern).expect("language pattern"),
        }
    }

    fn language_in(&self, text: &str) -> Option<LanguageTarget> {
        let captured = self.language_pattern.captures(text)?;
        let name = captured.get(1)?.as_str().to_lowercase();
        let code = LANGUAGES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| *c)?;
        Some(LanguageTarget {
            code: code.to_string(),
            name: title_case(&name),
        })
    }
}

impl Default for KeywordIntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier for KeywordIntentClassifier {
    fn detect_translation(&self, question: &str) -> Option<LanguageTarget> {
        let q = question.to_lowercase();

        if TRIGGER_PHRASES.iter().any(|phrase| q.contains(phrase)) {
            if let Some(target) = self.language_in(&q) {
                return Some(target);
            }
        }

        // Simpler pattern: any mention of the transcript plus a language name.
        if q.contains("transcript") {
            return self.language_in(&q);
        }

        None
    }
}

/// Look up the display name for a language code.
pub fn language_name(code: &str) -> String {
    LANGUAGES
        .iter()
        .find(|(_, c)| *c == code)
        .map(|(name, _)| title_case(name))
        .unwrap_or_else(|| code.to_string())
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_translate_request() {
        let classifier = KeywordIntentClassifier::new();
        let target = classifier
            .detect_translation("Can you translate the transcript to Spanish?")
            .unwrap();
        assert_eq!(target.code, "es");
        assert_eq!(target.name, "Spanish");
    }

    #[test]
    fn test_detects_transcript_in_language() {
        let classifier = KeywordIntentClassifier::new();
        let target = classifier
            .detect_translation("show me the transcript in hindi please")
            .unwrap();
        assert_eq!(target.code, "hi");
    }

    #[test]
    fn test_plain_question_is_not_translation() {
        let classifier = KeywordIntentClassifier::new();
        assert!(classifier
            .detect_translation("What did the speaker say about dogs?")
            .is_none());
    }

    #[test]
    fn test_translate_without_language_is_ignored() {
        let classifier = KeywordIntentClassifier::new();
        assert!(classifier.detect_translation("translate this for me").is_none());
    }

    #[test]
    fn test_language_word_boundary() {
        let classifier = KeywordIntentClassifier::new();
        // "polish" only matches as a whole word; "polished" must not.
        assert!(classifier
            .detect_translation("the transcript sounds polished")
            .is_none());
        assert!(classifier
            .detect_translation("transcript in polish")
            .is_some());
    }

    #[test]
    fn test_language_name_lookup() {
        assert_eq!(language_name("es"), "Spanish");
        assert_eq!(language_name("zz"), "zz");
    }
}

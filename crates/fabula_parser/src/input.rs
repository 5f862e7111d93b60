//! Player input normalization.
//!
//! Raw input is case-folded, selected punctuation becomes whitespace,
//! stop words are dropped, and the remaining words are rejoined with
//! single spaces. Triggers match against this normalized form only, so
//! "Take the LAMP!" and "take lamp" dispatch identically.

/// Punctuation that separates words. Hyphens stay, so "tin-opener"
/// remains one word.
const PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':', '\'', '"', '(', ')'];

/// Knobs for input normalization and noun-phrase resolution.
#[derive(Clone, Debug)]
pub struct MatchConfig {
    /// Words removed from input and from item names before matching.
    pub stop_words: Vec<String>,

    /// When set, the first word of a phrase is the noun and the rest
    /// are adjectives; otherwise the noun is the last word.
    pub noun_first: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            stop_words: vec!["a".to_string(), "an".to_string(), "the".to_string()],
            noun_first: false,
        }
    }
}

impl MatchConfig {
    /// Builder method to replace the stop-word list.
    #[must_use]
    pub fn with_stop_words(mut self, words: Vec<String>) -> Self {
        self.stop_words = words;
        self
    }

    /// Builder method to set noun position.
    #[must_use]
    pub fn with_noun_first(mut self, noun_first: bool) -> Self {
        self.noun_first = noun_first;
        self
    }

    fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.iter().any(|s| s == word)
    }
}

/// Splits text into lowercased content words, dropping stop words.
#[must_use]
pub fn content_words(text: &str, config: &MatchConfig) -> Vec<String> {
    text.to_lowercase()
        .replace(PUNCTUATION, " ")
        .split_whitespace()
        .filter(|word| !config.is_stop_word(word))
        .map(str::to_string)
        .collect()
}

/// Normalizes one line of player input for trigger matching.
#[must_use]
pub fn normalize(input: &str, config: &MatchConfig) -> String {
    content_words(input, config).join(" ")
}

//! Tokenization policy shared by indexing, query embedding and fallback matching.
//!
//! # Processing Pipeline
//!
//! 1. **Unicode NFC normalization** - "café" (decomposed) → "café" (composed)
//! 2. **Lower-casing**
//! 3. **Alphabetic runs** - digits, punctuation, underscores and whitespace separate tokens
//! 4. **Length filter** - tokens outside `[min_len, max_len]` characters are dropped
//!
//! The output is deterministic: the same input always yields the same tokens
//! in the same order.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Minimum token length (characters) kept by default.
pub const DEFAULT_MIN_TOKEN_LEN: usize = 3;

/// Maximum token length (characters) kept by default.
pub const DEFAULT_MAX_TOKEN_LEN: usize = 50;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Alphabetic}+").expect("valid regex"));

/// Inclusive token length bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerConfig {
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            min_len: DEFAULT_MIN_TOKEN_LEN,
            max_len: DEFAULT_MAX_TOKEN_LEN,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    pub fn new(config: TokenizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> TokenizerConfig {
        self.config
    }

    /// Split `text` into index-eligible tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let normalized: String = text.nfc().collect::<String>().to_lowercase();
        WORD_RE
            .find_iter(&normalized)
            .map(|m| m.as_str())
            .filter(|word| self.accepts(word))
            .map(str::to_string)
            .collect()
    }

    fn accepts(&self, word: &str) -> bool {
        let len = word.chars().count();
        len >= self.config.min_len && len <= self.config.max_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn lowercases_and_strips_noise() {
        let tokens = Tokenizer::default().tokenize("Hello, WORLD! Data-driven (2024) design_doc");
        assert_eq!(
            tokens,
            vec!["hello", "world", "data", "driven", "design", "doc"]
        );
    }

    #[test]
    fn drops_short_and_long_tokens() {
        let long = "a".repeat(51);
        let exact = "b".repeat(50);
        let text = format!("an ox ate {long} {exact}");
        let tokens = Tokenizer::default().tokenize(&text);
        assert_eq!(tokens, vec!["ate".to_string(), exact]);
    }

    #[test]
    fn empty_and_whitespace_input_yield_nothing() {
        let tokenizer = Tokenizer::default();
        assert!(tokenizer.tokenize("").is_empty());
        assert!(tokenizer.tokenize("   \n\t ").is_empty());
        assert!(tokenizer.tokenize("42 7 !!").is_empty());
    }

    #[test]
    fn preserves_order_and_duplicates() {
        let tokens = Tokenizer::default().tokenize("food cooking food");
        assert_eq!(tokens, vec!["food", "cooking", "food"]);
    }

    #[test]
    fn keeps_accented_letters_and_composes_them() {
        let decomposed = "cafe\u{301} na\u{ef}ve";
        let tokens = Tokenizer::default().tokenize(decomposed);
        assert_eq!(tokens, vec!["café", "naïve"]);
    }

    #[test]
    fn length_is_measured_in_characters() {
        let tokenizer = Tokenizer::new(TokenizerConfig {
            min_len: 3,
            max_len: 4,
        });
        // Four characters, eight bytes.
        assert_eq!(tokenizer.tokenize("éééé"), vec!["éééé"]);
    }

    #[test]
    fn custom_bounds_are_inclusive() {
        let tokenizer = Tokenizer::new(TokenizerConfig {
            min_len: 2,
            max_len: 3,
        });
        assert_eq!(tokenizer.tokenize("a bb ccc dddd"), vec!["bb", "ccc"]);
    }

    proptest! {
        #[test]
        fn tokenize_is_deterministic_and_bounded(text in "\\PC{0,200}") {
            let tokenizer = Tokenizer::default();
            let first = tokenizer.tokenize(&text);
            let second = tokenizer.tokenize(&text);
            prop_assert_eq!(&first, &second);
            for token in &first {
                let len = token.chars().count();
                prop_assert!((DEFAULT_MIN_TOKEN_LEN..=DEFAULT_MAX_TOKEN_LEN).contains(&len));
                prop_assert!(token.chars().all(char::is_alphabetic));
            }
        }
    }
}

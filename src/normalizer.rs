//! Text normalization applied to the winning extraction strategy's output.
//!
//! 1. Collapse every whitespace run to a single space and trim
//! 2. Cap to the first `max_words` words (1500 for summaries, 1000 for quizzes)
//! 3. Split on `". "`, drop fragments of `min_fragment_chars` characters or
//!    fewer (stray nav labels, button text), rejoin with `". "`
//! 4. Reject the result if fewer than `min_words` words remain
//!
//! The cap runs before fragment filtering so that normalizing already
//! normalized text is a no-op: capping afterwards could leave a short trailing
//! fragment that a second pass would drop.

use crate::config::ExtractionConfig;
use crate::utils::word_count;
use itertools::Itertools;
use thiserror::Error;

/// Why normalization rejected a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("normalized text has {words} words, below the floor of {floor}")]
    TooShort { words: usize, floor: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    max_words: usize,
    min_words: usize,
    min_fragment_chars: usize,
}

impl Normalizer {
    pub fn new(max_words: usize, min_words: usize, min_fragment_chars: usize) -> Self {
        Self {
            max_words,
            min_words,
            min_fragment_chars,
        }
    }

    /// Normalizer for the given word cap, floors taken from `config`.
    pub fn from_config(config: &ExtractionConfig, max_words: usize) -> Self {
        Self::new(max_words, config.min_words, config.min_fragment_chars)
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    pub fn normalize(&self, text: &str) -> Result<String, NormalizeError> {
        let collapsed = collapse_whitespace(text);
        let capped = cap_words(&collapsed, self.max_words);
        let cleaned = drop_short_fragments(&capped, self.min_fragment_chars);

        let words = word_count(&cleaned);
        if words < self.min_words {
            return Err(NormalizeError::TooShort {
                words,
                floor: self.min_words,
            });
        }
        Ok(cleaned)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        let config = ExtractionConfig::default();
        Self::from_config(&config, config.summary_max_words)
    }
}

/// Collapse whitespace runs to single spaces and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().join(" ")
}

fn cap_words(text: &str, max_words: usize) -> String {
    text.split_whitespace().take(max_words).join(" ")
}

fn drop_short_fragments(text: &str, min_chars: usize) -> String {
    text.split(". ")
        .map(str::trim)
        .filter(|fragment| fragment.chars().count() > min_chars)
        .join(". ")
}

//! The question bank: random normal/impostor prompt pairs for each round.
//!
//! Ships with a built-in set; an external JSON file (an array of
//! `{"normal": ..., "impostor": ...}` objects) can replace it via config.

use crate::types::QuestionPair;
use rand::Rng;
use std::path::Path;

/// Errors that can occur while loading an external question file
#[derive(Debug, thiserror::Error)]
pub enum QuestionBankError {
    #[error("failed to read question file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse question file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct QuestionBank {
    pairs: Vec<QuestionPair>,
}

impl QuestionBank {
    /// The compiled-in default set.
    pub fn builtin() -> Self {
        let pairs = BUILTIN_PAIRS
            .iter()
            .map(|(normal, impostor)| QuestionPair {
                normal: (*normal).to_string(),
                impostor: (*impostor).to_string(),
            })
            .collect();
        Self { pairs }
    }

    /// An empty bank (rounds fall back to the placeholder pair).
    pub fn empty() -> Self {
        Self { pairs: Vec::new() }
    }

    pub fn from_file(path: &Path) -> Result<Self, QuestionBankError> {
        let raw = std::fs::read_to_string(path)?;
        let pairs: Vec<QuestionPair> = serde_json::from_str(&raw)?;
        Ok(Self { pairs })
    }

    /// Load from `path` when configured, falling back to the built-in set
    /// when no file is given or the file can't be used.
    pub fn load(path: Option<&Path>) -> Self {
        match path {
            Some(p) => match Self::from_file(p) {
                Ok(bank) => {
                    tracing::info!("Loaded {} question pairs from {}", bank.len(), p.display());
                    bank
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to load question file {}: {}. Using built-in questions.",
                        p.display(),
                        e
                    );
                    Self::builtin()
                }
            },
            None => Self::builtin(),
        }
    }

    /// A uniformly random pair, or `None` when the bank is empty.
    pub fn next(&self) -> Option<QuestionPair> {
        if self.pairs.is_empty() {
            return None;
        }
        let mut rng = rand::rng();
        let idx = rng.random_range(0..self.pairs.len());
        Some(self.pairs[idx].clone())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::builtin()
    }
}

/// (normal, impostor): the two prompts must invite answers that look alike,
/// otherwise the impostor is given away for free.
const BUILTIN_PAIRS: &[(&str, &str)] = &[
    (
        "What's the best food to eat at midnight?",
        "What's the best food to eat for breakfast?",
    ),
    (
        "Name something you'd bring to a desert island.",
        "Name something you'd bring on a camping trip.",
    ),
    (
        "What's a movie everyone should see at least once?",
        "What's a movie you could watch every week?",
    ),
    (
        "What job would you be terrible at?",
        "What job would you secretly love to try?",
    ),
    (
        "What's the best gift you've ever received?",
        "What's the best gift you've ever given?",
    ),
    (
        "Which animal would make the best roommate?",
        "Which animal would make the worst roommate?",
    ),
    (
        "What's something you always forget to pack?",
        "What's something you always pack but never use?",
    ),
    (
        "What's the perfect pizza topping?",
        "What topping should never touch a pizza?",
    ),
    (
        "What's a sound you love?",
        "What's a sound you can't stand?",
    ),
    (
        "What would you do first if you won the lottery?",
        "What would you do first if you lost your wallet?",
    ),
    (
        "What's the best superpower for everyday life?",
        "What's the most useless superpower you can think of?",
    ),
    (
        "What's a country you'd love to visit?",
        "What's a country you'd love to live in?",
    ),
    (
        "What's the best thing about weekends?",
        "What's the best thing about holidays?",
    ),
    (
        "Name a skill everyone should learn.",
        "Name a skill you wish you had learned as a kid.",
    ),
    (
        "What's your go-to karaoke song?",
        "What song do you secretly know all the words to?",
    ),
    (
        "What's the most overrated drink?",
        "What's the most underrated drink?",
    ),
];

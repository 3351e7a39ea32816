//! Label mapping and rewrite output checks

use crate::model::{Advisory, Polarity};

/// Maps a classifier's raw label vocabulary onto [`Polarity`]
#[derive(Debug, Clone)]
pub struct LabelMapping {
    negative: Vec<String>,
    positive: Vec<String>,
    neutral: Vec<String>,
    /// Fall back to substring conventions for unlisted labels: an upper-case
    /// tag ("NEG", "POS", "NEU") or the full word in any case
    substring_fallback: bool,
}

impl Default for LabelMapping {
    fn default() -> Self {
        Self::new(
            vec!["negative".to_string(), "neg".to_string()],
            vec!["positive".to_string(), "pos".to_string()],
            vec!["neutral".to_string(), "neu".to_string()],
        )
    }
}

impl LabelMapping {
    pub fn new(negative: Vec<String>, positive: Vec<String>, neutral: Vec<String>) -> Self {
        let lower = |labels: Vec<String>| -> Vec<String> {
            labels
                .into_iter()
                .map(|l| l.trim().to_lowercase())
                .filter(|l| !l.is_empty())
                .collect()
        };

        Self {
            negative: lower(negative),
            positive: lower(positive),
            neutral: lower(neutral),
            substring_fallback: true,
        }
    }

    /// Only exact (case-insensitive) matches against the configured lists
    pub fn strict(mut self) -> Self {
        self.substring_fallback = false;
        self
    }

    /// Map a raw label to its polarity
    pub fn polarity(&self, label: &str) -> Polarity {
        let raw = label.trim();
        let label = raw.to_lowercase();

        if self.negative.contains(&label) {
            return Polarity::Negative;
        }
        if self.positive.contains(&label) {
            return Polarity::Positive;
        }
        if self.neutral.contains(&label) {
            return Polarity::Neutral;
        }

        if self.substring_fallback {
            let matches = |tag: &str, word: &str| raw.contains(tag) || label.contains(word);
            if matches("NEG", "negative") {
                return Polarity::Negative;
            }
            if matches("POS", "positive") {
                return Polarity::Positive;
            }
            if matches("NEU", "neutral") {
                return Polarity::Neutral;
            }
        }

        Polarity::Unknown
    }
}

/// Acknowledgement phrases the rewriter is told not to produce
pub const DEFAULT_BOILERPLATE_PHRASES: &[&str] = &[
    "はい、承知いたしました",
    "はい、かしこまりました",
    "承知いたしました",
    "かしこまりました",
    "Sure, here",
    "Certainly",
    "Here is the rewritten",
    "Here's the rewritten",
];

/// Detects acknowledgement boilerplate in rewriter output.
///
/// Detection is advisory: the output is reported, never altered.
#[derive(Debug, Clone)]
pub struct BoilerplateDetector {
    phrases: Vec<String>,
}

impl Default for BoilerplateDetector {
    fn default() -> Self {
        Self::new(DEFAULT_BOILERPLATE_PHRASES.iter().map(|p| p.to_string()))
    }
}

impl BoilerplateDetector {
    pub fn new(phrases: impl IntoIterator<Item = String>) -> Self {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// A detector that never reports anything
    pub fn disabled() -> Self {
        Self { phrases: vec![] }
    }

    /// Report every configured phrase found in the output
    pub fn check(&self, output: &str) -> Vec<Advisory> {
        let output_lower = output.to_lowercase();
        self.phrases
            .iter()
            .filter(|phrase| output_lower.contains(&phrase.to_lowercase()))
            .map(|phrase| Advisory::BoilerplateDetected {
                phrase: phrase.clone(),
            })
            .collect()
    }
}

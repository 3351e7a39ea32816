//! Sentiment classifier adapters

pub mod huggingface;
pub mod stub;

pub use huggingface::HuggingFaceClassifier;
pub use stub::StubClassifier;

use serde::{Deserialize, Serialize};

/// Configuration for hosted sentiment classifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Model repository ID
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Ask the inference service to block until a cold model is loaded
    pub wait_for_model: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: "jarvisx17/japanese-sentiment-analysis".to_string(),
            timeout_secs: 30,
            wait_for_model: true,
        }
    }
}

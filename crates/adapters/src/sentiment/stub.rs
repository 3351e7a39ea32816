//! Stub classifier for testing and offline mode

use async_trait::async_trait;
use gentle_post_domain::{Classification, ClassificationError, SentimentClassifier};

const NEGATIVE_WORDS: &[&str] = &[
    "最悪", "嫌い", "つらい", "辛い", "悲しい", "疲れた", "ムカつく", "うざい", "bad", "awful",
    "terrible", "hate", "worst", "sad", "angry",
];

const POSITIVE_WORDS: &[&str] = &[
    "最高", "好き", "嬉しい", "楽しい", "ありがとう", "good", "great", "love", "happy", "best",
    "thanks",
];

/// Stub classifier that returns configurable responses
pub struct StubClassifier {
    response: Option<Classification>,
    error: Option<ClassificationError>,
}

impl StubClassifier {
    /// Create a stub that always returns a specific classification
    pub fn with_response(response: Classification) -> Self {
        Self {
            response: Some(response),
            error: None,
        }
    }

    /// Create a stub that always returns an error
    pub fn with_error(error: ClassificationError) -> Self {
        Self {
            response: None,
            error: Some(error),
        }
    }

    /// Create a stub that scores text against a small keyword lexicon
    pub fn lexicon() -> Self {
        Self {
            response: None,
            error: None,
        }
    }
}

impl Default for StubClassifier {
    fn default() -> Self {
        Self::lexicon()
    }
}

fn count_hits(text: &str, words: &[&str]) -> usize {
    words.iter().filter(|w| text.contains(*w)).count()
}

fn lexicon_classify(text: &str) -> Classification {
    let lower = text.to_lowercase();
    let negative = count_hits(&lower, NEGATIVE_WORDS);
    let positive = count_hits(&lower, POSITIVE_WORDS);

    let (label, hits) = match negative.cmp(&positive) {
        std::cmp::Ordering::Greater => ("negative", negative - positive),
        std::cmp::Ordering::Less => ("positive", positive - negative),
        std::cmp::Ordering::Equal => return Classification::new("neutral", 0.5),
    };

    let score = (0.6 + 0.1 * hits as f64).min(0.99);
    Classification::new(label, score)
}

#[async_trait]
impl SentimentClassifier for StubClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, ClassificationError> {
        if let Some(ref error) = self.error {
            return Err(match error {
                ClassificationError::Api(msg) => ClassificationError::Api(msg.clone()),
                ClassificationError::InvalidFormat(msg) => {
                    ClassificationError::InvalidFormat(msg.clone())
                }
                ClassificationError::ModelLoading(after) => ClassificationError::ModelLoading(*after),
                ClassificationError::RateLimited => ClassificationError::RateLimited,
                ClassificationError::Timeout => ClassificationError::Timeout,
                ClassificationError::Config(msg) => ClassificationError::Config(msg.clone()),
            });
        }

        if let Some(ref response) = self.response {
            return Ok(response.clone());
        }

        Ok(lexicon_classify(text))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lexicon_negative() {
        let result = StubClassifier::lexicon()
            .classify("今日は最悪だった")
            .await
            .unwrap();

        assert_eq!(result.label, "negative");
        assert!(result.score > 0.5);
    }

    #[tokio::test]
    async fn test_lexicon_positive() {
        let result = StubClassifier::lexicon()
            .classify("今日は最高だった")
            .await
            .unwrap();

        assert_eq!(result.label, "positive");
    }

    #[tokio::test]
    async fn test_lexicon_neutral_without_hits() {
        let result = StubClassifier::lexicon()
            .classify("The bus leaves at nine")
            .await
            .unwrap();

        assert_eq!(result, Classification::new("neutral", 0.5));
    }

    #[tokio::test]
    async fn test_configured_response() {
        let classifier = StubClassifier::with_response(Classification::new("NEG", 0.42));
        let result = classifier.classify("anything").await.unwrap();

        assert_eq!(result.label, "NEG");
        assert_eq!(result.score, 0.42);
    }

    #[tokio::test]
    async fn test_error_stub() {
        let classifier = StubClassifier::with_error(ClassificationError::Timeout);
        let result = classifier.classify("anything").await;

        assert!(matches!(result, Err(ClassificationError::Timeout)));
    }
}

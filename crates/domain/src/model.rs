//! Domain models and value objects

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Sentiment polarity derived from a classifier's raw label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
    /// The label did not map onto any known polarity
    Unknown,
}

impl Polarity {
    /// Whether this polarity triggers a rewrite
    pub fn is_negative(self) -> bool {
        matches!(self, Polarity::Negative)
    }
}

/// Top-ranked label and confidence reported by a sentiment classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Raw label as reported by the model (e.g. "NEGATIVE", "NEG", "positive")
    pub label: String,
    /// Confidence score, typically 0.0-1.0
    pub score: f64,
}

impl Classification {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Non-fatal observation about a rewrite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// The rewriter output contained an acknowledgement phrase it was told to omit
    BoilerplateDetected { phrase: String },
}

/// Output of one pipeline run over non-empty text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub label: String,
    pub score: f64,
    pub polarity: Polarity,
    /// Text shown to the audience: the original unless the text was negative
    pub transformed_text: String,
    /// Whether `transformed_text` came from the rewriter
    pub rewritten: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advisories: Vec<Advisory>,
}

/// Opaque reference to a stored attachment (e.g. an uploaded image file name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentRef(pub String);

impl AttachmentRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AttachmentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A new submission from an authenticated user
#[derive(Debug, Clone)]
pub struct SubmissionInput {
    /// Owner identity supplied by the surrounding identity layer
    pub owner: String,
    /// Raw text, may be empty when an attachment is supplied
    pub text: Option<String>,
    pub attachment: Option<AttachmentRef>,
}

impl SubmissionInput {
    /// The text, or `None` if it is missing or whitespace only
    pub fn non_blank_text(&self) -> Option<&str> {
        non_blank(self.text.as_deref())
    }

    /// At least one of text or attachment must be present
    pub fn is_empty(&self) -> bool {
        self.non_blank_text().is_none() && self.attachment.is_none()
    }
}

pub(crate) fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// The four fields derived from a single pipeline run.
///
/// They are always written together so a record never pairs new text with a
/// stale label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostContent {
    pub text: Option<String>,
    pub transformed: Option<String>,
    pub label: Option<String>,
    pub score: Option<f64>,
}

impl PostContent {
    /// Content for an attachment-only record
    pub fn empty() -> Self {
        Self {
            text: None,
            transformed: None,
            label: None,
            score: None,
        }
    }

    pub fn from_result(text: &str, result: &PipelineResult) -> Self {
        Self {
            text: Some(text.to_string()),
            transformed: Some(result.transformed_text.clone()),
            label: Some(result.label.clone()),
            score: Some(result.score),
        }
    }
}

/// A persisted post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub owner: String,
    #[serde(flatten)]
    pub content: PostContent,
    pub attachment: Option<AttachmentRef>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl PostRecord {
    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.owner == owner
    }
}

/// Requested changes to an existing post
#[derive(Debug, Clone, Default)]
pub struct PostEdit {
    /// Replacement text; triggers a full pipeline re-run
    pub text: Option<String>,
    pub attachment: AttachmentChange,
}

/// What to do with a post's attachment during an edit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AttachmentChange {
    #[default]
    Keep,
    Remove,
    Replace(AttachmentRef),
}

/// Listing order by creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostOrder {
    #[default]
    Newest,
    Oldest,
}

impl std::str::FromStr for PostOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "newest" | "desc" => Ok(PostOrder::Newest),
            "oldest" | "asc" => Ok(PostOrder::Oldest),
            other => Err(format!("unknown order '{}', expected newest or oldest", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_whitespace_only_is_empty() {
        let input = SubmissionInput {
            owner: "alice".to_string(),
            text: Some("   \n".to_string()),
            attachment: None,
        };
        assert!(input.is_empty());
        assert_eq!(input.non_blank_text(), None);
    }

    #[test]
    fn test_attachment_only_submission_is_not_empty() {
        let input = SubmissionInput {
            owner: "alice".to_string(),
            text: None,
            attachment: Some(AttachmentRef::new("cat.png")),
        };
        assert!(!input.is_empty());
    }

    #[test]
    fn test_post_order_parses_aliases() {
        assert_eq!("asc".parse::<PostOrder>().unwrap(), PostOrder::Oldest);
        assert_eq!("Newest".parse::<PostOrder>().unwrap(), PostOrder::Newest);
        assert!("sideways".parse::<PostOrder>().is_err());
    }

    #[test]
    fn test_post_record_serializes_flat_content() {
        let record = PostRecord {
            id: Uuid::nil(),
            owner: "alice".to_string(),
            content: PostContent {
                text: Some("hi".to_string()),
                transformed: Some("hi".to_string()),
                label: Some("POSITIVE".to_string()),
                score: Some(0.9),
            },
            attachment: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["label"], "POSITIVE");
        assert_eq!(value["created_at"], "1970-01-01T00:00:00Z");
    }
}

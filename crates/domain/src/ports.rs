//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::model::{AttachmentRef, Classification, PostContent, PostOrder, PostRecord};

/// Error type for sentiment classifier operations
#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("Classifier API error: {0}")]
    Api(String),
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
    #[error("Model is loading, retry after: {0:?}")]
    ModelLoading(Option<std::time::Duration>),
    #[error("Rate limited")]
    RateLimited,
    #[error("Timeout")]
    Timeout,
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Port for sentiment classification
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Classify non-empty text, returning the model's single top-ranked label
    async fn classify(&self, text: &str) -> Result<Classification, ClassificationError>;

    /// Short provider name for logs and diagnostics
    fn name(&self) -> &'static str;
}

/// Error type for tone rewriter operations
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("Rewriter API error: {0}")]
    Api(String),
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
    #[error("Rewriter returned empty output")]
    Empty,
    #[error("Rate limited")]
    RateLimited,
    #[error("Timeout")]
    Timeout,
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Port for generative tone rewriting
#[async_trait]
pub trait ToneRewriter: Send + Sync {
    /// Rewrite non-empty text into a gentler phrasing
    async fn rewrite(&self, text: &str) -> Result<String, RewriteError>;

    /// Short provider name for logs and diagnostics
    fn name(&self) -> &'static str;
}

/// Error type for post store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Not found: {0}")]
    NotFound(Uuid),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for persisting posts
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Insert a new record
    async fn insert(&self, record: &PostRecord) -> Result<(), StoreError>;

    /// Fetch a record by ID
    async fn get(&self, id: Uuid) -> Result<Option<PostRecord>, StoreError>;

    /// Apply an edit in a single write.
    ///
    /// `content` overwrites text, transformed text, label and score together.
    /// `attachment` is `None` to leave it alone and `Some(None)` to clear it.
    /// Either everything is written or nothing is.
    async fn apply_edit(
        &self,
        id: Uuid,
        content: Option<&PostContent>,
        attachment: Option<Option<&AttachmentRef>>,
    ) -> Result<(), StoreError>;

    /// Delete a record, failing with `NotFound` if it does not exist
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// All records of one owner
    async fn list_by_owner(
        &self,
        owner: &str,
        order: PostOrder,
    ) -> Result<Vec<PostRecord>, StoreError>;

    /// All records of every owner
    async fn list_all(&self, order: PostOrder) -> Result<Vec<PostRecord>, StoreError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

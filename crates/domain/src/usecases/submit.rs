//! Submission use case - runs the pipeline and persists the result
//!
//! Every presentation adapter (CLI, HTTP) goes through [`SubmissionService`]
//! so the gating logic lives in exactly one place.

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::{
    model::{
        AttachmentChange, PipelineResult, PostContent, PostEdit, PostOrder, PostRecord,
        SubmissionInput, non_blank,
    },
    ports::{Clock, PostStore, SentimentClassifier, StoreError, ToneRewriter},
    usecases::transform::{PipelineError, TransformationPipeline},
};

/// What to persist when the rewriter is unavailable for a negative post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RewriteFallback {
    /// Refuse the submission and surface a retryable error
    #[default]
    Reject,
    /// Persist the original text as the transformed text, keeping the classification
    KeepOriginal,
}

impl std::str::FromStr for RewriteFallback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reject" => Ok(RewriteFallback::Reject),
            "keep_original" => Ok(RewriteFallback::KeepOriginal),
            other => Err(format!(
                "unknown rewrite fallback '{}', expected reject or keep_original",
                other
            )),
        }
    }
}

/// Configuration for the submission service
#[derive(Debug, Clone)]
pub struct SubmissionConfig {
    pub rewrite_fallback: RewriteFallback,
    /// Upper bound for one pipeline run (None = unbounded)
    pub request_timeout: Option<Duration>,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            rewrite_fallback: RewriteFallback::Reject,
            request_timeout: Some(Duration::from_secs(60)),
        }
    }
}

/// Errors from the submission service
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Either text or an attachment is required")]
    EmptySubmission,
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("Processing timed out after {0:?}")]
    TimedOut(Duration),
    #[error("Post {0} not found")]
    NotFound(Uuid),
    #[error("Post {0} belongs to another user")]
    NotOwner(Uuid),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl SubmissionError {
    /// Whether the caller should prompt the user to try again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SubmissionError::Pipeline(_) | SubmissionError::TimedOut(_)
        )
    }
}

/// Shared caller of the transformation pipeline
pub struct SubmissionService<C: ?Sized, R: ?Sized, S: ?Sized, Cl: ?Sized> {
    pipeline: Arc<TransformationPipeline<C, R>>,
    store: Arc<S>,
    clock: Arc<Cl>,
    config: SubmissionConfig,
}

impl<C: ?Sized, R: ?Sized, S: ?Sized, Cl: ?Sized> Clone for SubmissionService<C, R, S, Cl> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            config: self.config.clone(),
        }
    }
}

impl<C, R, S, Cl> SubmissionService<C, R, S, Cl>
where
    C: SentimentClassifier + ?Sized,
    R: ToneRewriter + ?Sized,
    S: PostStore + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(
        pipeline: Arc<TransformationPipeline<C, R>>,
        store: Arc<S>,
        clock: Arc<Cl>,
        config: SubmissionConfig,
    ) -> Self {
        Self {
            pipeline,
            store,
            clock,
            config,
        }
    }

    /// Classify, maybe rewrite, and persist a new post
    pub async fn submit(&self, input: SubmissionInput) -> Result<PostRecord, SubmissionError> {
        if input.is_empty() {
            return Err(SubmissionError::EmptySubmission);
        }

        let content = self.derive_content(input.non_blank_text()).await?;

        let record = PostRecord {
            id: Uuid::new_v4(),
            owner: input.owner,
            content,
            attachment: input.attachment,
            created_at: self.clock.now(),
        };

        self.store.insert(&record).await?;

        tracing::info!(
            post_id = %record.id,
            owner = %record.owner,
            label = ?record.content.label,
            has_attachment = record.attachment.is_some(),
            "Stored post"
        );

        Ok(record)
    }

    /// Run the pipeline without persisting anything
    pub async fn preview(&self, text: &str) -> Result<Option<PipelineResult>, SubmissionError> {
        self.run_pipeline(Some(text)).await
    }

    /// Edit an owned post.
    ///
    /// New text re-runs the whole pipeline. Content and attachment changes are
    /// written in one store call, and only once the run has succeeded.
    pub async fn edit(
        &self,
        id: Uuid,
        owner: &str,
        edit: PostEdit,
    ) -> Result<PostRecord, SubmissionError> {
        let mut record = self.owned_record(id, owner).await?;

        let attachment = match &edit.attachment {
            AttachmentChange::Keep => record.attachment.clone(),
            AttachmentChange::Remove => None,
            AttachmentChange::Replace(attachment) => Some(attachment.clone()),
        };

        let new_content = match edit.text.as_deref() {
            Some(text) => Some(self.derive_content(non_blank(Some(text))).await?),
            None => None,
        };

        let has_text = match &new_content {
            Some(content) => content.text.is_some(),
            None => record.content.text.is_some(),
        };
        if !has_text && attachment.is_none() {
            return Err(SubmissionError::EmptySubmission);
        }

        let attachment_update = match &edit.attachment {
            AttachmentChange::Keep => None,
            _ => Some(attachment.as_ref()),
        };
        self.store
            .apply_edit(id, new_content.as_ref(), attachment_update)
            .await
            .map_err(not_found_as_submission)?;

        if let Some(content) = new_content {
            record.content = content;
        }
        record.attachment = attachment;

        tracing::info!(
            post_id = %id,
            owner = %owner,
            text_changed = edit.text.is_some(),
            attachment = ?edit.attachment,
            "Edited post"
        );

        Ok(record)
    }

    /// Delete an owned post
    pub async fn delete(&self, id: Uuid, owner: &str) -> Result<PostRecord, SubmissionError> {
        let record = self.owned_record(id, owner).await?;
        self.store.delete(id).await.map_err(not_found_as_submission)?;

        tracing::info!(post_id = %id, owner = %owner, "Deleted post");
        Ok(record)
    }

    /// Posts of one owner
    pub async fn list_mine(
        &self,
        owner: &str,
        order: PostOrder,
    ) -> Result<Vec<PostRecord>, SubmissionError> {
        Ok(self.store.list_by_owner(owner, order).await?)
    }

    /// Posts of every owner
    pub async fn feed(&self, order: PostOrder) -> Result<Vec<PostRecord>, SubmissionError> {
        Ok(self.store.list_all(order).await?)
    }

    async fn owned_record(&self, id: Uuid, owner: &str) -> Result<PostRecord, SubmissionError> {
        let record = self
            .store
            .get(id)
            .await?
            .ok_or(SubmissionError::NotFound(id))?;

        if !record.is_owned_by(owner) {
            tracing::warn!(post_id = %id, owner = %owner, "Rejected mutation by non-owner");
            return Err(SubmissionError::NotOwner(id));
        }

        Ok(record)
    }

    async fn derive_content(&self, text: Option<&str>) -> Result<PostContent, SubmissionError> {
        let Some(text) = text else {
            return Ok(PostContent::empty());
        };

        match self.run_pipeline(Some(text)).await {
            Ok(Some(result)) => Ok(PostContent::from_result(text, &result)),
            Ok(None) => Ok(PostContent::empty()),
            Err(SubmissionError::Pipeline(PipelineError::RewriteUnavailable {
                classification,
                source,
            })) if self.config.rewrite_fallback == RewriteFallback::KeepOriginal => {
                tracing::warn!(error = %source, "Rewrite unavailable, keeping original text");
                Ok(PostContent {
                    text: Some(text.to_string()),
                    transformed: Some(text.to_string()),
                    label: Some(classification.label),
                    score: Some(classification.score),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn run_pipeline(
        &self,
        text: Option<&str>,
    ) -> Result<Option<PipelineResult>, SubmissionError> {
        let run = self.pipeline.process(text);
        match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| {
                    tracing::warn!(timeout = ?limit, "Pipeline run timed out");
                    SubmissionError::TimedOut(limit)
                })?
                .map_err(SubmissionError::from),
            None => run.await.map_err(SubmissionError::from),
        }
    }
}

fn not_found_as_submission(e: StoreError) -> SubmissionError {
    match e {
        StoreError::NotFound(id) => SubmissionError::NotFound(id),
        other => SubmissionError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttachmentRef, Classification};
    use crate::ports::{ClassificationError, RewriteError};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use time::OffsetDateTime;

    /// Labels text containing "最悪" or "bad" as negative
    struct KeywordClassifier {
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    impl KeywordClassifier {
        fn new() -> Self {
            Self {
                fail: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SentimentClassifier for KeywordClassifier {
        async fn classify(&self, text: &str) -> Result<Classification, ClassificationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(ClassificationError::Timeout);
            }
            if text.contains("最悪") || text.contains("bad") {
                Ok(Classification::new("negative", 0.93))
            } else {
                Ok(Classification::new("positive", 0.88))
            }
        }

        fn name(&self) -> &'static str {
            "keyword"
        }
    }

    enum RewriterMode {
        Soften,
        Fail,
        Hang,
    }

    struct FakeRewriter {
        mode: RewriterMode,
    }

    #[async_trait]
    impl ToneRewriter for FakeRewriter {
        async fn rewrite(&self, text: &str) -> Result<String, RewriteError> {
            match self.mode {
                RewriterMode::Soften => Ok(format!("(やさしく) {}", text.replace("最悪", "大変"))),
                RewriterMode::Fail => Err(RewriteError::Api("503".to_string())),
                RewriterMode::Hang => {
                    tokio::time::sleep(Duration::from_secs(600)).await;
                    Ok("too late".to_string())
                }
            }
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    #[derive(Default)]
    struct FakeStore {
        records: Mutex<Vec<PostRecord>>,
        fail_attachment_writes: AtomicBool,
    }

    impl FakeStore {
        fn len(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PostStore for FakeStore {
        async fn insert(&self, record: &PostRecord) -> Result<(), StoreError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn get(&self, id: Uuid) -> Result<Option<PostRecord>, StoreError> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == id)
                .cloned())
        }

        async fn apply_edit(
            &self,
            id: Uuid,
            content: Option<&PostContent>,
            attachment: Option<Option<&AttachmentRef>>,
        ) -> Result<(), StoreError> {
            if attachment.is_some() && self.fail_attachment_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Database("disk I/O error".to_string()));
            }
            let mut records = self.records.lock().unwrap();
            let record = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or(StoreError::NotFound(id))?;
            if let Some(content) = content {
                record.content = content.clone();
            }
            if let Some(attachment) = attachment {
                record.attachment = attachment.cloned();
            }
            Ok(())
        }

        async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|r| r.id != id);
            if records.len() == before {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        }

        async fn list_by_owner(
            &self,
            owner: &str,
            _order: PostOrder,
        ) -> Result<Vec<PostRecord>, StoreError> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.owner == owner)
                .cloned()
                .collect())
        }

        async fn list_all(&self, _order: PostOrder) -> Result<Vec<PostRecord>, StoreError> {
            Ok(self.records.lock().unwrap().clone())
        }
    }

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> OffsetDateTime {
            OffsetDateTime::UNIX_EPOCH
        }
    }

    type TestService = SubmissionService<KeywordClassifier, FakeRewriter, FakeStore, FixedClock>;

    fn service_with(
        mode: RewriterMode,
        config: SubmissionConfig,
    ) -> (TestService, Arc<KeywordClassifier>, Arc<FakeStore>) {
        let classifier = Arc::new(KeywordClassifier::new());
        let rewriter = Arc::new(FakeRewriter { mode });
        let store = Arc::new(FakeStore::default());
        let pipeline = Arc::new(TransformationPipeline::new(
            Arc::clone(&classifier),
            rewriter,
        ));
        let service = SubmissionService::new(
            pipeline,
            Arc::clone(&store),
            Arc::new(FixedClock),
            config,
        );
        (service, classifier, store)
    }

    fn service() -> (TestService, Arc<KeywordClassifier>, Arc<FakeStore>) {
        service_with(RewriterMode::Soften, SubmissionConfig::default())
    }

    fn text_input(owner: &str, text: &str) -> SubmissionInput {
        SubmissionInput {
            owner: owner.to_string(),
            text: Some(text.to_string()),
            attachment: None,
        }
    }

    #[tokio::test]
    async fn test_submit_negative_post_stores_rewrite() {
        let (service, _, store) = service();

        let record = service
            .submit(text_input("alice", "今日は最悪だった"))
            .await
            .unwrap();

        assert_eq!(record.content.text.as_deref(), Some("今日は最悪だった"));
        assert_eq!(
            record.content.transformed.as_deref(),
            Some("(やさしく) 今日は大変だった")
        );
        assert_eq!(record.content.label.as_deref(), Some("negative"));
        assert_eq!(record.content.score, Some(0.93));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_positive_post_keeps_text() {
        let (service, _, _) = service();

        let record = service
            .submit(text_input("alice", "今日は最高だった"))
            .await
            .unwrap();

        assert_eq!(record.content.transformed.as_deref(), Some("今日は最高だった"));
        assert_eq!(record.created_at, OffsetDateTime::UNIX_EPOCH);
    }

    #[tokio::test]
    async fn test_attachment_only_submission_skips_pipeline() {
        let (service, classifier, store) = service();

        let record = service
            .submit(SubmissionInput {
                owner: "alice".to_string(),
                text: Some(String::new()),
                attachment: Some(AttachmentRef::new("sunset.jpg")),
            })
            .await
            .unwrap();

        assert_eq!(record.content, PostContent::empty());
        assert_eq!(record.attachment, Some(AttachmentRef::new("sunset.jpg")));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_submission_rejected() {
        let (service, classifier, store) = service();

        let err = service.submit(text_input("alice", "  ")).await.unwrap_err();

        assert!(matches!(err, SubmissionError::EmptySubmission));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_classifier_failure_creates_no_record() {
        let (service, classifier, store) = service();
        classifier.fail.store(true, Ordering::SeqCst);

        let err = service
            .submit(text_input("alice", "今日は最悪だった"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SubmissionError::Pipeline(PipelineError::ClassificationUnavailable(_))
        ));
        assert!(err.is_retryable());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_rewrite_failure_rejects_by_default() {
        let (service, _, store) = service_with(RewriterMode::Fail, SubmissionConfig::default());

        let err = service
            .submit(text_input("alice", "bad day"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SubmissionError::Pipeline(PipelineError::RewriteUnavailable { .. })
        ));
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_rewrite_failure_keep_original_fallback() {
        let (service, classifier, store) = service_with(
            RewriterMode::Fail,
            SubmissionConfig {
                rewrite_fallback: RewriteFallback::KeepOriginal,
                ..Default::default()
            },
        );

        let record = service.submit(text_input("alice", "bad day")).await.unwrap();

        assert_eq!(record.content.transformed.as_deref(), Some("bad day"));
        assert_eq!(record.content.label.as_deref(), Some("negative"));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_pipeline_times_out() {
        let (service, _, store) = service_with(
            RewriterMode::Hang,
            SubmissionConfig {
                request_timeout: Some(Duration::from_secs(5)),
                ..Default::default()
            },
        );

        let err = service
            .submit(text_input("alice", "bad day"))
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::TimedOut(_)));
        assert!(err.is_retryable());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn test_edit_reruns_pipeline_and_replaces_all_fields() {
        let (service, _, store) = service();
        let record = service
            .submit(text_input("alice", "今日は最高だった"))
            .await
            .unwrap();

        let edited = service
            .edit(
                record.id,
                "alice",
                PostEdit {
                    text: Some("今日は最悪だった".to_string()),
                    attachment: AttachmentChange::Replace(AttachmentRef::new("rain.png")),
                },
            )
            .await
            .unwrap();

        let stored = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(stored, edited);
        assert_eq!(stored.content.text.as_deref(), Some("今日は最悪だった"));
        assert_eq!(stored.content.label.as_deref(), Some("negative"));
        assert_eq!(stored.content.score, Some(0.93));
        assert_eq!(
            stored.content.transformed.as_deref(),
            Some("(やさしく) 今日は大変だった")
        );
        assert_eq!(stored.attachment, Some(AttachmentRef::new("rain.png")));
    }

    #[tokio::test]
    async fn test_failed_edit_leaves_record_untouched() {
        let (service, classifier, store) = service();
        let record = service
            .submit(text_input("alice", "今日は最高だった"))
            .await
            .unwrap();
        classifier.fail.store(true, Ordering::SeqCst);

        let err = service
            .edit(
                record.id,
                "alice",
                PostEdit {
                    text: Some("今日は最悪だった".to_string()),
                    attachment: AttachmentChange::Keep,
                },
            )
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        let stored = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(stored, record);
    }

    #[tokio::test]
    async fn test_edit_with_failing_attachment_write_changes_nothing() {
        let (service, _, store) = service();
        let record = service
            .submit(text_input("alice", "今日は最高だった"))
            .await
            .unwrap();
        store.fail_attachment_writes.store(true, Ordering::SeqCst);

        let err = service
            .edit(
                record.id,
                "alice",
                PostEdit {
                    text: Some("今日は最悪だった".to_string()),
                    attachment: AttachmentChange::Replace(AttachmentRef::new("rain.png")),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::Store(StoreError::Database(_))));
        let stored = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(stored, record);
    }

    #[tokio::test]
    async fn test_edit_by_other_user_rejected() {
        let (service, _, store) = service();
        let record = service
            .submit(text_input("alice", "今日は最高だった"))
            .await
            .unwrap();

        let err = service
            .edit(
                record.id,
                "mallory",
                PostEdit {
                    text: Some("hijacked".to_string()),
                    attachment: AttachmentChange::Keep,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::NotOwner(id) if id == record.id));
        assert_eq!(store.get(record.id).await.unwrap().unwrap(), record);
    }

    #[tokio::test]
    async fn test_removing_last_attachment_of_image_post_rejected() {
        let (service, _, _) = service();
        let record = service
            .submit(SubmissionInput {
                owner: "alice".to_string(),
                text: None,
                attachment: Some(AttachmentRef::new("cat.png")),
            })
            .await
            .unwrap();

        let err = service
            .edit(
                record.id,
                "alice",
                PostEdit {
                    text: None,
                    attachment: AttachmentChange::Remove,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SubmissionError::EmptySubmission));
    }

    #[tokio::test]
    async fn test_delete_requires_owner() {
        let (service, _, store) = service();
        let record = service
            .submit(text_input("alice", "hello"))
            .await
            .unwrap();

        let err = service.delete(record.id, "bob").await.unwrap_err();
        assert!(matches!(err, SubmissionError::NotOwner(_)));
        assert_eq!(store.len(), 1);

        service.delete(record.id, "alice").await.unwrap();
        assert_eq!(store.len(), 0);

        let err = service.delete(record.id, "alice").await.unwrap_err();
        assert!(matches!(err, SubmissionError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_preview_does_not_persist() {
        let (service, _, store) = service();

        let result = service.preview("bad day").await.unwrap().unwrap();

        assert!(result.rewritten);
        assert_eq!(store.len(), 0);
    }
}

//! Sentiment-gated transformation pipeline

use std::sync::Arc;

use crate::{
    model::{Classification, PipelineResult, non_blank},
    policy::{BoilerplateDetector, LabelMapping},
    ports::{ClassificationError, RewriteError, SentimentClassifier, ToneRewriter},
};

/// Errors from a pipeline run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Classification unavailable: {0}")]
    ClassificationUnavailable(#[source] ClassificationError),
    /// Carries the classification that gated the rewrite so callers can
    /// persist a degraded record without classifying again.
    #[error("Rewrite unavailable: {source}")]
    RewriteUnavailable {
        classification: Classification,
        #[source]
        source: RewriteError,
    },
}

/// Classifies text and rewrites it when the sentiment is negative.
///
/// Holds no mutable state; share one instance behind an `Arc`.
pub struct TransformationPipeline<C: ?Sized, R: ?Sized> {
    classifier: Arc<C>,
    rewriter: Arc<R>,
    labels: LabelMapping,
    boilerplate: BoilerplateDetector,
}

impl<C, R> TransformationPipeline<C, R>
where
    C: SentimentClassifier + ?Sized,
    R: ToneRewriter + ?Sized,
{
    pub fn new(classifier: Arc<C>, rewriter: Arc<R>) -> Self {
        Self {
            classifier,
            rewriter,
            labels: LabelMapping::default(),
            boilerplate: BoilerplateDetector::default(),
        }
    }

    pub fn with_label_mapping(mut self, labels: LabelMapping) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_boilerplate_detector(mut self, boilerplate: BoilerplateDetector) -> Self {
        self.boilerplate = boilerplate;
        self
    }

    /// Run the pipeline.
    ///
    /// Returns `Ok(None)` without calling either service when there is no text.
    pub async fn process(
        &self,
        text: Option<&str>,
    ) -> Result<Option<PipelineResult>, PipelineError> {
        let Some(text) = non_blank(text) else {
            tracing::debug!("No text supplied, skipping classification");
            return Ok(None);
        };

        let classification = self
            .classifier
            .classify(text)
            .await
            .map_err(|e| {
                tracing::warn!(
                    classifier = self.classifier.name(),
                    error = %e,
                    "Classification failed"
                );
                PipelineError::ClassificationUnavailable(e)
            })?;

        let polarity = self.labels.polarity(&classification.label);

        tracing::info!(
            classifier = self.classifier.name(),
            label = %classification.label,
            score = classification.score,
            polarity = ?polarity,
            text_length = text.chars().count(),
            "Classified text"
        );

        if !polarity.is_negative() {
            return Ok(Some(PipelineResult {
                label: classification.label,
                score: classification.score,
                polarity,
                transformed_text: text.to_string(),
                rewritten: false,
                advisories: vec![],
            }));
        }

        let rewritten = match self.rewriter.rewrite(text).await {
            Ok(output) => output.trim().to_string(),
            Err(e) => {
                tracing::warn!(
                    rewriter = self.rewriter.name(),
                    error = %e,
                    "Rewrite failed"
                );
                return Err(PipelineError::RewriteUnavailable {
                    classification,
                    source: e,
                });
            }
        };

        if rewritten.is_empty() {
            return Err(PipelineError::RewriteUnavailable {
                classification,
                source: RewriteError::Empty,
            });
        }

        let advisories = self.boilerplate.check(&rewritten);
        if !advisories.is_empty() {
            tracing::warn!(
                rewriter = self.rewriter.name(),
                advisories = ?advisories,
                "Rewriter output contains acknowledgement boilerplate"
            );
        }

        tracing::info!(
            rewriter = self.rewriter.name(),
            rewritten_length = rewritten.chars().count(),
            "Rewrote negative text"
        );

        Ok(Some(PipelineResult {
            label: classification.label,
            score: classification.score,
            polarity,
            transformed_text: rewritten,
            rewritten: true,
            advisories,
        }))
    }
}

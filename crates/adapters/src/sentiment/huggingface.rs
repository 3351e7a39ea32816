//! Hugging Face text-classification inference adapter

use async_trait::async_trait;
use gentle_post_domain::{Classification, ClassificationError, SentimentClassifier};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ClassifierConfig;

const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/hf-inference";

/// Classifier backed by a hosted text-classification model
pub struct HuggingFaceClassifier {
    client: Client,
    api_token: Option<SecretString>,
    base_url: String,
    config: ClassifierConfig,
}

impl HuggingFaceClassifier {
    pub fn new(
        api_token: Option<SecretString>,
        config: ClassifierConfig,
    ) -> Result<Self, ClassificationError> {
        Self::with_base_url(api_token, DEFAULT_BASE_URL.to_string(), config)
    }

    pub fn with_base_url(
        api_token: Option<SecretString>,
        base_url: String,
        config: ClassifierConfig,
    ) -> Result<Self, ClassificationError> {
        let client = crate::http_client(config.timeout_secs)
            .map_err(|e| ClassificationError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_token,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    async fn call_api(&self, text: &str) -> Result<Vec<LabelScore>, ClassificationError> {
        let request = InferenceRequest {
            inputs: text,
            options: InferenceOptions {
                wait_for_model: self.config.wait_for_model,
            },
        };

        let url = format!("{}/models/{}", self.base_url, self.config.model);

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request);

        if let Some(token) = &self.api_token {
            builder = builder.header(
                "Authorization",
                format!("Bearer {}", token.expose_secret()),
            );
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ClassificationError::Timeout
            } else {
                ClassificationError::Api(e.to_string())
            }
        })?;

        if response.status() == 429 {
            return Err(ClassificationError::RateLimited);
        }

        if response.status() == 503 {
            let body: Option<LoadingResponse> = response.json().await.ok();
            let retry_after = body
                .and_then(|b| b.estimated_time)
                .filter(|secs| secs.is_finite() && *secs >= 0.0)
                .map(Duration::from_secs_f64);
            return Err(ClassificationError::ModelLoading(retry_after));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClassificationError::Api(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let api_response: InferenceResponse = response
            .json()
            .await
            .map_err(|e| ClassificationError::InvalidFormat(e.to_string()))?;

        Ok(api_response.into_scores())
    }
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    options: InferenceOptions,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Single inputs come back either nested per input or flat
#[derive(Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl InferenceResponse {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            InferenceResponse::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
            InferenceResponse::Flat(scores) => scores,
        }
    }
}

#[derive(Deserialize)]
struct LoadingResponse {
    estimated_time: Option<f64>,
}

/// Pick the single highest-scoring label
fn top_label(scores: Vec<LabelScore>) -> Option<LabelScore> {
    scores
        .into_iter()
        .filter(|s| s.score.is_finite())
        .max_by(|a, b| a.score.total_cmp(&b.score))
}

#[async_trait]
impl SentimentClassifier for HuggingFaceClassifier {
    async fn classify(&self, text: &str) -> Result<Classification, ClassificationError> {
        let scores = self.call_api(text).await?;

        let top = top_label(scores)
            .ok_or_else(|| ClassificationError::InvalidFormat("No labels returned".to_string()))?;

        tracing::debug!(
            model = %self.config.model,
            label = %top.label,
            score = top.score,
            "Hugging Face classification"
        );

        Ok(Classification::new(top.label, top.score))
    }

    fn name(&self) -> &'static str {
        "huggingface"
    }
}

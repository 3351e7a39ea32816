//! Google Gemini API adapter

use async_trait::async_trait;
use gentle_post_domain::{RewriteError, ToneRewriter};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{LlmConfig, build_rewrite_prompt, check_status, finish_output, transport_error};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini rewriter
pub struct GeminiRewriter {
    client: Client,
    api_key: SecretString,
    base_url: String,
    config: LlmConfig,
}

impl GeminiRewriter {
    pub fn new(api_key: SecretString, config: LlmConfig) -> Result<Self, RewriteError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string(), config)
    }

    pub fn with_base_url(
        api_key: SecretString,
        base_url: String,
        config: LlmConfig,
    ) -> Result<Self, RewriteError> {
        let client = crate::http_client(config.timeout_secs)
            .map_err(|e| RewriteError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    async fn call_api(&self, prompt: &str) -> Result<String, RewriteError> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(self.config.temperature),
                max_output_tokens: Some(self.config.max_output_tokens),
            }),
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.config.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response).await?;

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| RewriteError::InvalidFormat(e.to_string()))?;

        Ok(api_response
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default())
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "generationConfig")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "maxOutputTokens")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: ResponseContent,
}

#[derive(Default, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[async_trait]
impl ToneRewriter for GeminiRewriter {
    async fn rewrite(&self, text: &str) -> Result<String, RewriteError> {
        let prompt = build_rewrite_prompt(text);
        let raw = self.call_api(&prompt).await?;
        finish_output(&raw)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/models/gemini-2.5-flash:generateContent";

    fn rewriter(server: &MockServer) -> GeminiRewriter {
        GeminiRewriter::with_base_url(
            SecretString::new("test-key".into()),
            server.uri(),
            LlmConfig::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_rewrite_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_string_contains("今日は最悪だった"))
            .and(body_string_contains("「はい、承知いたしました。」"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"parts": [{"text": "  今日は少し大変な一日でした。\n"}]}
                }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = rewriter(&mock_server)
            .rewrite("今日は最悪だった")
            .await
            .unwrap();

        assert_eq!(result, "今日は少し大変な一日でした。");
    }

    #[tokio::test]
    async fn test_rewrite_no_candidates_is_empty() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&mock_server)
            .await;

        let result = rewriter(&mock_server).rewrite("text").await;

        assert!(matches!(result, Err(RewriteError::Empty)));
    }

    #[tokio::test]
    async fn test_rewrite_rate_limited_is_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = rewriter(&mock_server).rewrite("text").await;

        assert!(matches!(result, Err(RewriteError::RateLimited)));
    }

    #[tokio::test]
    async fn test_rewrite_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal error"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = rewriter(&mock_server).rewrite("text").await;

        assert!(matches!(result, Err(RewriteError::Api(_))));
    }
}

//! Anthropic Messages API adapter

use async_trait::async_trait;
use gentle_post_domain::{RewriteError, ToneRewriter};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{
    LlmConfig, SYSTEM_INSTRUCTION, build_rewrite_prompt, check_status, finish_output,
    transport_error,
};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

/// Anthropic rewriter
pub struct AnthropicRewriter {
    client: Client,
    api_key: SecretString,
    base_url: String,
    config: LlmConfig,
}

impl AnthropicRewriter {
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
        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_output_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            system: Some(SYSTEM_INSTRUCTION.to_string()),
            temperature: Some(self.config.temperature),
        };

        let url = format!("{}/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response).await?;

        let api_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| RewriteError::InvalidFormat(e.to_string()))?;

        Ok(api_response
            .content
            .into_iter()
            .filter(|c| c.r#type == "text")
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join(""))
    }
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    r#type: String,
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ToneRewriter for AnthropicRewriter {
    async fn rewrite(&self, text: &str) -> Result<String, RewriteError> {
        let prompt = build_rewrite_prompt(text);
        let raw = self.call_api(&prompt).await?;
        finish_output(&raw)
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rewriter(server: &MockServer) -> AnthropicRewriter {
        AnthropicRewriter::with_base_url(
            SecretString::new("test-key".into()),
            server.uri(),
            LlmConfig {
                model: "claude-3-5-haiku-latest".to_string(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_rewrite_joins_text_blocks() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", API_VERSION))
            .and(body_string_contains("書き換えた文章だけを出力してください"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": [
                    {"type": "text", "text": "少し疲れて"},
                    {"type": "text", "text": "しまいました。"}
                ]
            })))
            .mount(&mock_server)
            .await;

        let result = rewriter(&mock_server).rewrite("疲れた").await.unwrap();

        assert_eq!(result, "少し疲れてしまいました。");
    }

    #[tokio::test]
    async fn test_rewrite_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let result = rewriter(&mock_server).rewrite("text").await;

        assert!(matches!(result, Err(RewriteError::RateLimited)));
    }

    #[tokio::test]
    async fn test_rewrite_no_text_blocks_is_empty() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": []
            })))
            .mount(&mock_server)
            .await;

        let result = rewriter(&mock_server).rewrite("text").await;

        assert!(matches!(result, Err(RewriteError::Empty)));
    }
}

//! OpenAI chat-completions adapter, also used for OpenAI-compatible providers

use async_trait::async_trait;
use gentle_post_domain::{RewriteError, ToneRewriter};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{
    LlmConfig, SYSTEM_INSTRUCTION, build_rewrite_prompt, check_status, finish_output,
    transport_error,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI rewriter using the chat-completions endpoint
pub struct OpenAiRewriter {
    client: Client,
    api_key: SecretString,
    base_url: String,
    config: LlmConfig,
}

impl OpenAiRewriter {
    pub fn new(api_key: SecretString, config: LlmConfig) -> Result<Self, RewriteError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string(), config)
    }

    /// Point at any server exposing `/chat/completions`
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
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_output_tokens),
        };

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response).await?;

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| RewriteError::InvalidFormat(e.to_string()))?;

        Ok(api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl ToneRewriter for OpenAiRewriter {
    async fn rewrite(&self, text: &str) -> Result<String, RewriteError> {
        let prompt = build_rewrite_prompt(text);
        let raw = self.call_api(&prompt).await?;
        finish_output(&raw)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rewriter(server: &MockServer) -> OpenAiRewriter {
        OpenAiRewriter::with_base_url(
            SecretString::new("test-key".into()),
            server.uri(),
            LlmConfig {
                model: "gpt-4o-mini".to_string(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_rewrite_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o-mini"})))
            .and(body_string_contains("柔らかく優しい言葉に書き換えてください"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "That was a rough day.\n"}}]
            })))
            .mount(&mock_server)
            .await;

        let result = rewriter(&mock_server)
            .rewrite("That was the worst day")
            .await
            .unwrap();

        assert_eq!(result, "That was a rough day.");
    }

    #[tokio::test]
    async fn test_rewrite_null_content_is_empty() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": null}}]
            })))
            .mount(&mock_server)
            .await;

        let result = rewriter(&mock_server).rewrite("text").await;

        assert!(matches!(result, Err(RewriteError::Empty)));
    }

    #[tokio::test]
    async fn test_rewrite_malformed_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let result = rewriter(&mock_server).rewrite("text").await;

        assert!(matches!(result, Err(RewriteError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn test_rewrite_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&mock_server)
            .await;

        let result = rewriter(&mock_server).rewrite("text").await;

        assert!(matches!(result, Err(RewriteError::Api(msg)) if msg.contains("401")));
    }
}

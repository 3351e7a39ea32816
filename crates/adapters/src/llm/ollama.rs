//! Ollama local LLM adapter

use async_trait::async_trait;
use gentle_post_domain::{RewriteError, ToneRewriter};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    LlmConfig, SYSTEM_INSTRUCTION, build_rewrite_prompt, check_status, finish_output,
    transport_error,
};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama rewriter for local LLMs
pub struct OllamaRewriter {
    client: Client,
    base_url: String,
    config: LlmConfig,
}

impl OllamaRewriter {
    pub fn new(config: LlmConfig) -> Result<Self, RewriteError> {
        Self::with_base_url(DEFAULT_BASE_URL.to_string(), config)
    }

    pub fn with_base_url(base_url: String, config: LlmConfig) -> Result<Self, RewriteError> {
        let client = crate::http_client(config.timeout_secs)
            .map_err(|e| RewriteError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    async fn call_api(&self, prompt: &str) -> Result<String, RewriteError> {
        let request = OllamaRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            system: Some(SYSTEM_INSTRUCTION.to_string()),
            stream: false,
            options: Some(OllamaOptions {
                temperature: Some(self.config.temperature),
                num_predict: Some(self.config.max_output_tokens as i32),
            }),
        };

        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response).await?;

        let api_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| RewriteError::InvalidFormat(e.to_string()))?;

        Ok(api_response.response)
    }
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

#[async_trait]
impl ToneRewriter for OllamaRewriter {
    async fn rewrite(&self, text: &str) -> Result<String, RewriteError> {
        let prompt = build_rewrite_prompt(text);
        let raw = self.call_api(&prompt).await?;
        finish_output(&raw)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

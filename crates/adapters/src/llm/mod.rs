//! LLM tone rewriter adapters

pub mod anthropic;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod stub;

pub use anthropic::AnthropicRewriter;
pub use gemini::GeminiRewriter;
pub use ollama::OllamaRewriter;
pub use openai::OpenAiRewriter;
pub use stub::StubRewriter;

use gentle_post_domain::RewriteError;
use serde::{Deserialize, Serialize};

/// Common LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name/ID
    pub model: String,
    /// Temperature (0.0-1.0)
    pub temperature: f64,
    /// Maximum output tokens
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.7,
            max_output_tokens: 1024,
            timeout_secs: 45,
        }
    }
}

/// System role given to chat-style providers
pub const SYSTEM_INSTRUCTION: &str =
    "You rewrite social media posts into gentle, kind wording. Output only the rewritten text.";

/// Fixed rewrite instruction sent ahead of every input
pub const REWRITE_INSTRUCTION: &str = "以下の文章を、意味を保ったまま柔らかく優しい言葉に書き換えてください。\
「はい、承知いたしました。」や「はい、かしこまりました。」のような前置きや返事は書かず、\
書き換えた文章だけを出力してください。";

/// Build the rewrite prompt for a single text
pub fn build_rewrite_prompt(text: &str) -> String {
    format!("{}\n\n入力文：{}", REWRITE_INSTRUCTION, text)
}

/// Trim provider output, treating blank output as a failed rewrite
pub fn finish_output(raw: &str) -> Result<String, RewriteError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RewriteError::Empty);
    }
    Ok(trimmed.to_string())
}

/// Map a transport failure from reqwest
pub(crate) fn transport_error(e: reqwest::Error) -> RewriteError {
    if e.is_timeout() {
        RewriteError::Timeout
    } else {
        RewriteError::Api(e.to_string())
    }
}

/// Map non-success HTTP statuses, consuming the response body for context
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, RewriteError> {
    if response.status() == 429 {
        return Err(RewriteError::RateLimited);
    }

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(RewriteError::Api(format!(
            "API returned {}: {}",
            status, body
        )));
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_instruction_and_text() {
        let prompt = build_rewrite_prompt("今日は最悪だった");

        assert!(prompt.starts_with(REWRITE_INSTRUCTION));
        assert!(prompt.ends_with("入力文：今日は最悪だった"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(build_rewrite_prompt("abc"), build_rewrite_prompt("abc"));
    }

    #[test]
    fn test_finish_output_trims() {
        assert_eq!(finish_output("  やさしい文  \n").unwrap(), "やさしい文");
    }

    #[test]
    fn test_finish_output_rejects_blank() {
        assert!(matches!(finish_output(" \n\t"), Err(RewriteError::Empty)));
    }
}

//! Configuration loading and management

use anyhow::{Context, Result};
use gentle_post_domain::policy::DEFAULT_BOILERPLATE_PHRASES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub sentiment: SentimentConfig,

    #[serde(default)]
    pub rewriter: RewriterConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub boilerplate: BoilerplateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// SQLite database path; `:memory:` keeps posts in process memory only
    #[serde(default = "default_state_db_path")]
    pub state_db_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `reject` or `keep_original`
    #[serde(default = "default_rewrite_fallback")]
    pub rewrite_fallback: String,

    /// Upper bound for one classify+rewrite run; 0 disables it
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    #[serde(default = "default_sentiment_provider")]
    pub provider: String,

    #[serde(default = "default_sentiment_model")]
    pub model: String,

    #[serde(default = "default_sentiment_base_url")]
    pub base_url: String,

    #[serde(default = "default_sentiment_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_sentiment_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_true")]
    pub wait_for_model: bool,

    #[serde(default = "default_negative_labels")]
    pub negative_labels: Vec<String>,

    #[serde(default = "default_positive_labels")]
    pub positive_labels: Vec<String>,

    #[serde(default = "default_neutral_labels")]
    pub neutral_labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriterConfig {
    #[serde(default = "default_rewriter_provider")]
    pub provider: String,

    #[serde(default = "default_rewriter_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_rewriter_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub anthropic: AnthropicConfig,

    #[serde(default)]
    pub ollama: OllamaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

/// Also covers OpenAI-compatible providers through `base_url`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    #[serde(default = "default_anthropic_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoilerplateConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_boilerplate_phrases")]
    pub phrases: Vec<String>,
}

// Default value functions
fn default_state_db_path() -> PathBuf {
    PathBuf::from("./gentle-post.sqlite")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_rewrite_fallback() -> String {
    "reject".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_sentiment_provider() -> String {
    "huggingface".to_string()
}

fn default_sentiment_model() -> String {
    "jarvisx17/japanese-sentiment-analysis".to_string()
}

fn default_sentiment_base_url() -> String {
    "https://router.huggingface.co/hf-inference".to_string()
}

fn default_sentiment_api_key_env() -> String {
    "HF_TOKEN".to_string()
}

fn default_sentiment_timeout() -> u64 {
    30
}

fn default_negative_labels() -> Vec<String> {
    vec!["negative".to_string(), "neg".to_string()]
}

fn default_positive_labels() -> Vec<String> {
    vec!["positive".to_string(), "pos".to_string()]
}

fn default_neutral_labels() -> Vec<String> {
    vec!["neutral".to_string(), "neu".to_string()]
}

fn default_rewriter_provider() -> String {
    "gemini".to_string()
}

fn default_rewriter_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    1024
}

fn default_rewriter_timeout() -> u64 {
    45
}

fn default_gemini_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_openai_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com/v1".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_boilerplate_phrases() -> Vec<String> {
    DEFAULT_BOILERPLATE_PHRASES
        .iter()
        .map(|p| p.to_string())
        .collect()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            state_db_path: default_state_db_path(),
            log_level: default_log_level(),
            rewrite_fallback: default_rewrite_fallback(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            provider: default_sentiment_provider(),
            model: default_sentiment_model(),
            base_url: default_sentiment_base_url(),
            api_key_env: default_sentiment_api_key_env(),
            timeout_secs: default_sentiment_timeout(),
            wait_for_model: true,
            negative_labels: default_negative_labels(),
            positive_labels: default_positive_labels(),
            neutral_labels: default_neutral_labels(),
        }
    }
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            provider: default_rewriter_provider(),
            model: default_rewriter_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_rewriter_timeout(),
            gemini: GeminiConfig::default(),
            openai: OpenAiConfig::default(),
            anthropic: AnthropicConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_gemini_api_key_env(),
            base_url: default_gemini_base_url(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_openai_api_key_env(),
            base_url: default_openai_base_url(),
        }
    }
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_anthropic_api_key_env(),
            base_url: default_anthropic_base_url(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for BoilerplateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            phrases: default_boilerplate_phrases(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        builder = builder.add_source(
            config::Environment::with_prefix("GENTLE_POST")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# gentle-post configuration

[general]
# Use ":memory:" to keep posts in process memory only
state_db_path = "./gentle-post.sqlite"
log_level = "info"
# What to store when a negative post cannot be rewritten: reject, keep_original
rewrite_fallback = "reject"
# Upper bound for one classify+rewrite run, 0 disables it
request_timeout_secs = 60

[sentiment]
provider = "huggingface"  # huggingface, stub
model = "jarvisx17/japanese-sentiment-analysis"
base_url = "https://router.huggingface.co/hf-inference"
api_key_env = "HF_TOKEN"
timeout_secs = 30
wait_for_model = true
# Model labels are matched case-insensitively
negative_labels = ["negative", "neg"]
positive_labels = ["positive", "pos"]
neutral_labels = ["neutral", "neu"]

[rewriter]
provider = "gemini"  # gemini, openai, anthropic, ollama, stub
model = "gemini-2.5-flash"
temperature = 0.7
max_output_tokens = 1024
timeout_secs = 45

[rewriter.gemini]
api_key_env = "GEMINI_API_KEY"
base_url = "https://generativelanguage.googleapis.com/v1beta"

[rewriter.openai]
# Point base_url at any OpenAI-compatible chat-completions server
api_key_env = "OPENAI_API_KEY"
base_url = "https://api.openai.com/v1"

[rewriter.anthropic]
api_key_env = "ANTHROPIC_API_KEY"
base_url = "https://api.anthropic.com/v1"

[rewriter.ollama]
base_url = "http://localhost:11434"

[server]
bind = "127.0.0.1:8080"

[boilerplate]
# Phrases reported (never removed) when a rewrite starts with an acknowledgement
enabled = true
phrases = ["はい、承知いたしました", "はい、かしこまりました", "承知いたしました", "かしこまりました", "Sure, here", "Certainly", "Here is the rewritten", "Here's the rewritten"]
"#
        .to_string()
    }
}

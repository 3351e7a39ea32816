//! Builds the submission service from configuration

use anyhow::{Context, Result, bail};
use gentle_post_adapters::{
    llm::{
        AnthropicRewriter, GeminiRewriter, LlmConfig as AdapterLlmConfig, OllamaRewriter,
        OpenAiRewriter, StubRewriter,
    },
    sentiment::{ClassifierConfig, HuggingFaceClassifier, StubClassifier},
    store::{InMemoryPostStore, SqlitePostStore},
};
use gentle_post_domain::policy::{BoilerplateDetector, LabelMapping};
use gentle_post_domain::usecases::{
    RewriteFallback, SubmissionConfig, SubmissionService, TransformationPipeline,
};
use gentle_post_domain::{PostStore, SentimentClassifier, SystemClock, ToneRewriter};
use secrecy::SecretString;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::args::TextInputArgs;
use crate::config::{AppConfig, RewriterConfig};

/// Submission service wired with boxed adapters
pub(crate) type AppService =
    SubmissionService<dyn SentimentClassifier, dyn ToneRewriter, dyn PostStore, SystemClock>;

const IN_MEMORY_DB: &str = ":memory:";

pub(crate) async fn build_service(config: &AppConfig) -> Result<AppService> {
    let classifier = build_classifier(config)?;
    let rewriter = build_rewriter(config)?;
    let store = build_store(config).await?;

    assemble_service(config, classifier, rewriter, store)
}

/// Wire already-built adapters according to the configured policies
pub(crate) fn assemble_service(
    config: &AppConfig,
    classifier: Arc<dyn SentimentClassifier>,
    rewriter: Arc<dyn ToneRewriter>,
    store: Arc<dyn PostStore>,
) -> Result<AppService> {
    let labels = LabelMapping::new(
        config.sentiment.negative_labels.clone(),
        config.sentiment.positive_labels.clone(),
        config.sentiment.neutral_labels.clone(),
    );

    let boilerplate = if config.boilerplate.enabled {
        BoilerplateDetector::new(config.boilerplate.phrases.iter().cloned())
    } else {
        BoilerplateDetector::disabled()
    };

    let pipeline = TransformationPipeline::new(classifier, rewriter)
        .with_label_mapping(labels)
        .with_boilerplate_detector(boilerplate);

    Ok(SubmissionService::new(
        Arc::new(pipeline),
        store,
        Arc::new(SystemClock),
        submission_config(config)?,
    ))
}

pub(crate) fn submission_config(config: &AppConfig) -> Result<SubmissionConfig> {
    let rewrite_fallback: RewriteFallback = config
        .general
        .rewrite_fallback
        .parse()
        .map_err(anyhow::Error::msg)
        .context("Invalid [general].rewrite_fallback")?;

    let request_timeout = match config.general.request_timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    Ok(SubmissionConfig {
        rewrite_fallback,
        request_timeout,
    })
}

pub(crate) fn build_classifier(config: &AppConfig) -> Result<Arc<dyn SentimentClassifier>> {
    let sentiment = &config.sentiment;

    match sentiment.provider.as_str() {
        "huggingface" => {
            let token = load_optional_api_key(&sentiment.api_key_env);
            let classifier_config = ClassifierConfig {
                model: sentiment.model.clone(),
                timeout_secs: sentiment.timeout_secs,
                wait_for_model: sentiment.wait_for_model,
            };
            let classifier = HuggingFaceClassifier::with_base_url(
                token,
                sentiment.base_url.clone(),
                classifier_config,
            )
            .context("Failed to configure Hugging Face classifier")?;
            Ok(Arc::new(classifier))
        }
        "stub" => Ok(Arc::new(StubClassifier::lexicon())),
        other => bail!("Unknown sentiment provider: {}", other),
    }
}

pub(crate) fn build_rewriter(config: &AppConfig) -> Result<Arc<dyn ToneRewriter>> {
    let rewriter = &config.rewriter;
    let llm_config = adapter_llm_config(rewriter);

    match rewriter.provider.as_str() {
        "gemini" => {
            let api_key = load_api_key(&rewriter.gemini.api_key_env, "gemini")?;
            Ok(Arc::new(
                GeminiRewriter::with_base_url(api_key, rewriter.gemini.base_url.clone(), llm_config)
                    .context("Failed to configure Gemini rewriter")?,
            ))
        }
        "openai" => {
            let base_url = rewriter.openai.base_url.trim();
            if base_url.is_empty() {
                bail!("OpenAI base_url is required");
            }
            let api_key = load_api_key(&rewriter.openai.api_key_env, "openai")?;
            Ok(Arc::new(
                OpenAiRewriter::with_base_url(api_key, base_url.to_string(), llm_config)
                    .context("Failed to configure OpenAI rewriter")?,
            ))
        }
        "anthropic" => {
            let api_key = load_api_key(&rewriter.anthropic.api_key_env, "anthropic")?;
            Ok(Arc::new(
                AnthropicRewriter::with_base_url(
                    api_key,
                    rewriter.anthropic.base_url.clone(),
                    llm_config,
                )
                .context("Failed to configure Anthropic rewriter")?,
            ))
        }
        "ollama" => {
            let base_url = rewriter.ollama.base_url.trim();
            let ollama = if base_url.is_empty() {
                OllamaRewriter::new(llm_config)
            } else {
                OllamaRewriter::with_base_url(base_url.to_string(), llm_config)
            };
            Ok(Arc::new(
                ollama.context("Failed to configure Ollama rewriter")?,
            ))
        }
        "stub" => Ok(Arc::new(StubRewriter::softening())),
        other => bail!("Unknown rewriter provider: {}", other),
    }
}

pub(crate) async fn build_store(config: &AppConfig) -> Result<Arc<dyn PostStore>> {
    let path = &config.general.state_db_path;

    if path.as_os_str() == IN_MEMORY_DB {
        tracing::warn!("Using in-memory post store; posts are lost on exit");
        return Ok(Arc::new(InMemoryPostStore::new()));
    }

    let store = SqlitePostStore::new(path)
        .await
        .with_context(|| format!("Failed to open post database: {}", path.display()))?;
    Ok(Arc::new(store))
}

fn adapter_llm_config(config: &RewriterConfig) -> AdapterLlmConfig {
    AdapterLlmConfig {
        model: config.model.clone(),
        temperature: config.temperature,
        max_output_tokens: config.max_output_tokens,
        timeout_secs: config.timeout_secs,
    }
}

pub(crate) fn load_api_key(env_var: &str, provider: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No API key env var configured for provider {}", provider);
    }

    let key = std::env::var(env_var).with_context(|| {
        format!(
            "Missing API key env var {} for provider {}",
            env_var, provider
        )
    })?;

    if key.trim().is_empty() {
        bail!(
            "API key env var {} is empty for provider {}",
            env_var,
            provider
        );
    }

    Ok(SecretString::new(key.into()))
}

/// Public inference endpoints accept anonymous calls at a lower rate limit
fn load_optional_api_key(env_var: &str) -> Option<SecretString> {
    if env_var.trim().is_empty() {
        return None;
    }

    match std::env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => Some(SecretString::new(key.into())),
        _ => {
            tracing::debug!(env_var = %env_var, "No sentiment API token set, calling anonymously");
            None
        }
    }
}

/// Read post text from `--text`, `--file`, or stdin (`--file -`)
pub(crate) fn read_text_input(input: &TextInputArgs) -> Result<Option<String>> {
    if let Some(ref text) = input.text {
        return Ok(Some(text.clone()));
    }

    match input.file {
        Some(ref path) => read_text_source(path).map(Some),
        None => Ok(None),
    }
}

pub(crate) fn read_text_source(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read from stdin")?;
        return Ok(text);
    }

    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))
}

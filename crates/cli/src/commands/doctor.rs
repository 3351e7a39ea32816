//! Doctor command - validate configuration and show status

use anyhow::Result;
use gentle_post_domain::PostOrder;
use serde::Serialize;
use std::path::PathBuf;

use super::service::{build_classifier, build_rewriter, build_store, submission_config};
use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    sentiment: CheckResult,
    rewriter: CheckResult,
    store: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        sentiment: CheckResult::error("Not checked"),
        rewriter: CheckResult::error("Not checked"),
        store: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = check_policies(&c);
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.sentiment = check_sentiment(config);
        report.rewriter = check_rewriter(config);
        report.store = check_store(config).await;
    }

    let checks = [
        &report.config,
        &report.sentiment,
        &report.rewriter,
        &report.store,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_policies(config: &AppConfig) -> CheckResult {
    match submission_config(config) {
        Ok(submission) => CheckResult::ok("Configuration loaded successfully").with_details(
            serde_json::json!({
                "rewrite_fallback": config.general.rewrite_fallback,
                "request_timeout_secs": submission.request_timeout.map(|t| t.as_secs()),
                "boilerplate_check": config.boilerplate.enabled,
            }),
        ),
        Err(e) => CheckResult::error(format!("{:#}", e)),
    }
}

fn check_sentiment(config: &AppConfig) -> CheckResult {
    let sentiment = &config.sentiment;

    if let Err(e) = build_classifier(config) {
        return CheckResult::error(format!("{:#}", e));
    }

    if sentiment.negative_labels.is_empty() {
        return CheckResult::warn(format!(
            "Provider: {}, no negative labels configured; nothing will be rewritten",
            sentiment.provider
        ));
    }

    match sentiment.provider.as_str() {
        "stub" => CheckResult::ok("Provider: stub (offline lexicon)"),
        provider => {
            let token_set = std::env::var(&sentiment.api_key_env)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false);
            let message = format!(
                "Provider: {}, Model: {}, Token: {} ({})",
                provider,
                sentiment.model,
                sentiment.api_key_env,
                if token_set { "set" } else { "not set" }
            );
            if token_set {
                CheckResult::ok(message)
            } else {
                CheckResult::warn(message)
            }
        }
    }
}

fn check_rewriter(config: &AppConfig) -> CheckResult {
    let rewriter = &config.rewriter;

    match build_rewriter(config) {
        Ok(_) if rewriter.provider == "stub" => CheckResult::ok("Provider: stub (offline)"),
        Ok(_) => CheckResult::ok(format!(
            "Provider: {}, Model: {}",
            rewriter.provider, rewriter.model
        )),
        Err(e) => CheckResult::error(format!("{:#}", e)),
    }
}

async fn check_store(config: &AppConfig) -> CheckResult {
    let store = match build_store(config).await {
        Ok(store) => store,
        Err(e) => return CheckResult::error(format!("{:#}", e)),
    };

    match store.list_all(PostOrder::Newest).await {
        Ok(posts) => CheckResult::ok(format!(
            "Database: {}, {} posts",
            config.general.state_db_path.display(),
            posts.len()
        )),
        Err(e) => CheckResult::error(format!("Failed to read posts: {}", e)),
    }
}

fn print_report(report: &DoctorReport) {
    println!("gentle-post Doctor Report");
    println!("=========================");
    println!();

    print_check("Config", &report.config);
    print_check("Sentiment", &report.sentiment);
    print_check("Rewriter", &report.rewriter);
    print_check("Store", &report.store);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready! Try: gentle-post preview --text \"今日は最悪だった\"");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}

//! Preview command - run the pipeline without storing anything

use anyhow::{Context, Result, bail};
use gentle_post_adapters::store::InMemoryPostStore;
use gentle_post_domain::Advisory;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::service::{
    assemble_service, build_classifier, build_rewriter, read_text_input, read_text_source,
};
use super::submit::submission_failure;
use crate::args::PreviewArgs;
use crate::config::AppConfig;

pub async fn execute(args: PreviewArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    // Default to stdin if no input specified
    let text = match read_text_input(&args.input)? {
        Some(text) => text,
        None => read_text_source(Path::new("-"))?,
    };

    // Nothing is persisted, so the configured database is never opened
    let service = assemble_service(
        &config,
        build_classifier(&config)?,
        build_rewriter(&config)?,
        Arc::new(InMemoryPostStore::new()),
    )?;

    let Some(result) = service.preview(&text).await.map_err(submission_failure)? else {
        bail!("No text provided for preview");
    };

    if args.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
        println!("{}", json);
        return Ok(());
    }

    println!("Preview");
    println!("=======");
    println!();
    println!("Sentiment: {} ({:.2})", result.label, result.score);
    println!(
        "Rewritten: {}",
        if result.rewritten { "yes" } else { "no" }
    );
    println!("Shown as: {}", result.transformed_text);

    for advisory in &result.advisories {
        match advisory {
            Advisory::BoilerplateDetected { phrase } => {
                println!("Note: rewrite contains acknowledgement boilerplate \"{}\"", phrase);
            }
        }
    }

    Ok(())
}

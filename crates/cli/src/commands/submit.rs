//! Submit command - classify, soften if negative, and store a post

use anyhow::{Context, Result};
use gentle_post_domain::usecases::SubmissionError;
use gentle_post_domain::{AttachmentRef, PostRecord, SubmissionInput};
use std::path::PathBuf;

use super::service::{build_service, read_text_input};
use crate::args::SubmitArgs;
use crate::config::AppConfig;

pub async fn execute(args: SubmitArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let service = build_service(&config).await?;

    let input = SubmissionInput {
        owner: args.user.user,
        text: read_text_input(&args.input)?,
        attachment: args.attachment.map(AttachmentRef::new),
    };

    tracing::info!(
        owner = %input.owner,
        text_length = input.text.as_deref().map(str::len).unwrap_or(0),
        has_attachment = input.attachment.is_some(),
        "Submitting post"
    );

    let record = service.submit(input).await.map_err(submission_failure)?;

    if args.json {
        let json = serde_json::to_string_pretty(&record).context("Failed to serialize post")?;
        println!("{}", json);
    } else {
        println!("Post saved");
        println!("==========");
        print_post(&record);
    }

    Ok(())
}

/// Attach a user-facing hint to submission failures
pub(crate) fn submission_failure(err: SubmissionError) -> anyhow::Error {
    let hint = if err.is_retryable() {
        "The post could not be processed right now, please try again"
    } else {
        match err {
            SubmissionError::EmptySubmission => "Nothing to post",
            SubmissionError::NotFound(_) | SubmissionError::NotOwner(_) => {
                "You can only change your own posts"
            }
            _ => "The post could not be saved",
        }
    };
    anyhow::Error::new(err).context(hint)
}

pub(crate) fn print_post(record: &PostRecord) {
    println!("ID: {}", record.id);
    println!("Owner: {}", record.owner);
    println!("Created: {}", record.created_at);

    match (&record.content.label, record.content.score) {
        (Some(label), Some(score)) => println!("Sentiment: {} ({:.2})", label, score),
        _ => println!("Sentiment: -"),
    }

    if let Some(text) = &record.content.text {
        println!("Original: {}", text);
    }
    if let Some(transformed) = &record.content.transformed {
        println!("Shown as: {}", transformed);
    }
    if let Some(attachment) = &record.attachment {
        println!("Attachment: {}", attachment);
    }
}

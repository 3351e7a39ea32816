//! Edit command - change text or attachment of an owned post

use anyhow::{Context, Result};
use gentle_post_domain::{AttachmentChange, AttachmentRef, PostEdit};
use std::path::PathBuf;

use super::service::{build_service, read_text_source};
use super::submit::{print_post, submission_failure};
use crate::args::EditArgs;
use crate::config::AppConfig;

pub async fn execute(args: EditArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let service = build_service(&config).await?;

    let text = match (args.text, args.file) {
        (Some(text), _) => Some(text),
        (None, Some(path)) => Some(read_text_source(&path)?),
        (None, None) => None,
    };

    let attachment = match (args.attachment, args.remove_attachment) {
        (Some(name), _) => AttachmentChange::Replace(AttachmentRef::new(name)),
        (None, true) => AttachmentChange::Remove,
        (None, false) => AttachmentChange::Keep,
    };

    if text.is_none() && attachment == AttachmentChange::Keep {
        anyhow::bail!("Nothing to edit: pass --text, --file, --attachment or --remove-attachment");
    }

    let record = service
        .edit(args.id, &args.user.user, PostEdit { text, attachment })
        .await
        .map_err(submission_failure)?;

    if args.json {
        let json = serde_json::to_string_pretty(&record).context("Failed to serialize post")?;
        println!("{}", json);
    } else {
        println!("Post updated");
        println!("============");
        print_post(&record);
    }

    Ok(())
}

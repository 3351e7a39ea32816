//! Delete command

use anyhow::Result;
use std::path::PathBuf;

use super::service::build_service;
use super::submit::submission_failure;
use crate::args::DeleteArgs;
use crate::config::AppConfig;

pub async fn execute(args: DeleteArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let service = build_service(&config).await?;

    let record = service
        .delete(args.id, &args.user.user)
        .await
        .map_err(submission_failure)?;

    println!("Deleted post {}", record.id);
    Ok(())
}

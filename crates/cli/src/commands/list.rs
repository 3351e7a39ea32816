//! List and feed commands - show stored posts

use anyhow::{Context, Result};
use gentle_post_domain::PostRecord;
use std::path::PathBuf;

use super::service::build_service;
use super::submit::{print_post, submission_failure};
use crate::args::{FeedArgs, ListArgs};
use crate::config::AppConfig;

/// Posts owned by one user
pub async fn execute_mine(args: ListArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let service = build_service(&config).await?;

    let posts = service
        .list_mine(&args.user.user, args.order)
        .await
        .map_err(submission_failure)?;

    print_posts(&posts, args.json)
}

/// Posts of every user
pub async fn execute_feed(args: FeedArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let service = build_service(&config).await?;

    let posts = service
        .feed(args.order)
        .await
        .map_err(submission_failure)?;

    print_posts(&posts, args.json)
}

fn print_posts(posts: &[PostRecord], json: bool) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(posts).context("Failed to serialize posts")?;
        println!("{}", json);
        return Ok(());
    }

    if posts.is_empty() {
        println!("No posts.");
        return Ok(());
    }

    for post in posts {
        print_post(post);
        println!();
    }

    Ok(())
}

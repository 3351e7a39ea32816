//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use gentle_post_domain::PostOrder;
use std::path::PathBuf;
use uuid::Uuid;

/// gentle-post: classify posts and soften negative ones before they are stored
#[derive(Parser, Debug)]
#[command(name = "gentle-post")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify, soften if negative, and store a new post
    Submit(SubmitArgs),

    /// Show what a text would become without storing it
    Preview(PreviewArgs),

    /// Edit one of your posts
    Edit(EditArgs),

    /// Delete one of your posts
    Delete(DeleteArgs),

    /// List your own posts
    List(ListArgs),

    /// List every post
    Feed(FeedArgs),

    /// Serve the HTTP API
    Serve(ServeArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

/// Identity of the acting user
#[derive(Args, Debug, Clone)]
pub struct UserArgs {
    /// User ID that owns the post
    #[arg(long, env = "GENTLE_POST_USER")]
    pub user: String,
}

/// Where post text comes from
#[derive(Args, Debug, Clone, Default)]
pub struct TextInputArgs {
    /// Post text
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,

    /// File containing the post text (use - for stdin)
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub user: UserArgs,

    #[command(flatten)]
    pub input: TextInputArgs,

    /// Reference to an already-uploaded attachment
    #[arg(long)]
    pub attachment: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub input: TextInputArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Post ID
    pub id: Uuid,

    #[command(flatten)]
    pub user: UserArgs,

    /// Replacement text (an empty string clears the text)
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,

    /// File containing the replacement text (use - for stdin)
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Replace the attachment
    #[arg(long, conflicts_with = "remove_attachment")]
    pub attachment: Option<String>,

    /// Remove the attachment
    #[arg(long)]
    pub remove_attachment: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Post ID
    pub id: Uuid,

    #[command(flatten)]
    pub user: UserArgs,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub user: UserArgs,

    /// Sort order (newest, oldest)
    #[arg(long, default_value = "newest")]
    pub order: PostOrder,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct FeedArgs {
    /// Sort order (newest, oldest)
    #[arg(long, default_value = "newest")]
    pub order: PostOrder,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on, overriding [server].bind
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

//! gentle-post CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = cli.log_level.clone().unwrap_or_else(|| configured_log_level(&cli));
    init_logging(&log_level)?;

    match cli.command {
        Commands::Submit(args) => commands::submit::execute(args, cli.config).await,
        Commands::Preview(args) => commands::preview::execute(args, cli.config).await,
        Commands::Edit(args) => commands::edit::execute(args, cli.config).await,
        Commands::Delete(args) => commands::delete::execute(args, cli.config).await,
        Commands::List(args) => commands::list::execute_mine(args, cli.config).await,
        Commands::Feed(args) => commands::list::execute_feed(args, cli.config).await,
        Commands::Serve(args) => commands::serve::execute(args, cli.config).await,
        Commands::Config(args) => commands::config::execute(args).await,
        Commands::Doctor(args) => commands::doctor::execute(args, cli.config).await,
    }
}

/// `[general].log_level`, falling back to info when the config cannot be read
fn configured_log_level(cli: &Cli) -> String {
    config::AppConfig::load(cli.config.as_deref())
        .map(|c| c.general.log_level)
        .unwrap_or_else(|_| "info".to_string())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

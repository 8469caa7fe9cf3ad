//! Somnia CLI - Private dream journal
//!
//! Usage:
//!   somnia init                         Initialize database
//!   somnia add --title "Flying"         Record a dream
//!   somnia stats                        Summary statistics
//!   somnia insights --refresh           Regenerate narrative insights

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Config { action } => match action {
            None => commands::cmd_config_show(),
            Some(ConfigAction::Path) => commands::cmd_config_path(),
        },
        Commands::Add(args) => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_add(&db, args).map(|_| ())
        }
        Commands::List { limit } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_list(&db, limit)
        }
        Commands::Show { id } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_show(&db, id)
        }
        Commands::Delete { id } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_delete(&db, id)
        }
        Commands::Import { file } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_import(&db, &file)
        }
        Commands::Export { output } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_export(&db, &output)
        }
        Commands::Stats { json } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_stats(&db, json)
        }
        Commands::Distribution { dimension, limit } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_distribution(&db, dimension, limit)
        }
        Commands::Trend { window } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_trend(&db, window)
        }
        Commands::Frequency { period } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_frequency(&db, period)
        }
        Commands::Patterns => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_patterns(&db)
        }
        Commands::Insights { refresh, json } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let orchestrator = commands::insight_orchestrator(db)?;
            commands::cmd_insights(&orchestrator, refresh, json).await
        }
        Commands::Cache { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let orchestrator = commands::insight_orchestrator(db)?;
            match action {
                CacheAction::Clear => commands::cmd_cache_clear(&orchestrator),
                CacheAction::Status => commands::cmd_cache_status(&orchestrator).await,
            }
        }
    }
}

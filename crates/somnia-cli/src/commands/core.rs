//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `insight_orchestrator` - Orchestrator wired to the configured backend
//! - `cmd_init` - Initialize the database
//! - `cmd_config_show` / `cmd_config_path` - Configuration display

use std::path::Path;

use anyhow::{Context, Result};
use somnia_core::ai::{AIClient, NarrativeBackend};
use somnia_core::config::{default_config_path, SomniaConfig};
use somnia_core::db::Database;
use somnia_core::insights::InsightOrchestrator;

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

/// Build the insight orchestrator from the config file and environment
pub fn insight_orchestrator(db: Database) -> Result<InsightOrchestrator<Database>> {
    let config = SomniaConfig::load().context("Failed to load configuration")?;
    let client = AIClient::from_env();
    match &client {
        Some(c) => tracing::debug!(backend = c.kind(), model = c.model(), host = c.host(), "Narrative backend"),
        None => tracing::debug!("No narrative backend configured"),
    }
    Ok(InsightOrchestrator::new(db, client, config))
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing journal at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;
    let count = db.count_dreams()?;
    println!("   {} dreams in journal", count);

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Journal initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Record a dream: somnia add --title \"Flying over the sea\"");
    println!("  2. See insights:   somnia insights");

    Ok(())
}

/// Print the effective configuration as TOML
pub fn cmd_config_show() -> Result<()> {
    let config = SomniaConfig::load().context("Failed to load configuration")?;
    print!("{}", config.to_toml()?);
    Ok(())
}

pub fn cmd_config_path() -> Result<()> {
    match default_config_path() {
        Some(path) => {
            let marker = if path.exists() { "" } else { " (not present, using defaults)" };
            println!("{}{}", path.display(), marker);
        }
        None => println!("No data directory available on this platform"),
    }
    Ok(())
}

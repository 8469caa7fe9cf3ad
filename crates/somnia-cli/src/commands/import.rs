//! Import and export command implementations

use std::path::Path;

use anyhow::{Context, Result};
use somnia_core::db::Database;
use somnia_core::export::ImportStats;

pub fn cmd_import(db: &Database, file: &Path) -> Result<()> {
    println!("📥 Importing dreams from {}...", file.display());

    let ImportStats { imported, skipped } = db
        .import_json(file)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    println!();
    println!("✅ Import complete!");
    println!("   Imported: {}", imported);
    if skipped > 0 {
        println!("   Skipped:  {} (unreadable entries, see log)", skipped);
    }

    Ok(())
}

pub fn cmd_export(db: &Database, output: &Path) -> Result<()> {
    let count = db
        .export_json(output)
        .with_context(|| format!("Failed to export to {}", output.display()))?;

    println!("✅ Exported {} dreams to {}", count, output.display());
    Ok(())
}

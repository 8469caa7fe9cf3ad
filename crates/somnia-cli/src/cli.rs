//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use somnia_core::analytics::{Dimension, Period};

/// Somnia - A private dream journal with analytics
#[derive(Parser)]
#[command(name = "somnia")]
#[command(about = "Self-hosted dream journal with analytics and insights", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "somnia.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for real journals)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set SOMNIA_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Record a dream
    Add(AddArgs),

    /// List recent dreams
    List {
        /// Maximum number of dreams to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show one dream in full
    Show {
        /// Dream ID
        id: i64,
    },

    /// Delete a dream
    Delete {
        /// Dream ID
        id: i64,
    },

    /// Import dreams from a JSON journal export
    Import {
        /// JSON file (an array of dreams or a `somnia export` document)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Export the journal as JSON
    Export {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show summary statistics
    Stats {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show how often values of a field occur
    Distribution {
        /// Field: emotions, after_emotions, themes, archetypes, symbols, characters, places
        #[arg(default_value = "emotions")]
        dimension: Dimension,

        /// Only show the top N values
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the daily clarity / sleep quality trend
    Trend {
        /// Moving average window (defaults to the configured window)
        #[arg(short, long)]
        window: Option<usize>,
    },

    /// Count dreams by week or month and dream type
    Frequency {
        /// Period: week, month
        #[arg(short, long, default_value = "month")]
        period: Period,
    },

    /// Show weekday and time-of-day patterns
    Patterns,

    /// Show narrative insights (cached for the configured TTL)
    Insights {
        /// Regenerate even if the cached insights are fresh
        #[arg(long)]
        refresh: bool,

        /// Print the payload as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the insight cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Show the effective configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

/// Arguments for `somnia add`
#[derive(clap::Args, Debug, Default)]
pub struct AddArgs {
    /// Dream title
    #[arg(short, long)]
    pub title: String,

    /// What happened in the dream
    #[arg(short, long, default_value = "")]
    pub content: String,

    /// When the dream happened (YYYY-MM-DD, RFC 3339, or epoch ms; defaults to now)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Dream clarity (1-5)
    #[arg(long)]
    pub clarity: Option<u8>,

    /// Sleep quality (1-5)
    #[arg(long)]
    pub sleep: Option<u8>,

    /// Emotions felt during the dream (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub emotions: Vec<String>,

    /// Emotion on waking
    #[arg(long)]
    pub after: Option<String>,

    /// Themes (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub themes: Vec<String>,

    /// Symbols (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Characters (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub characters: Vec<String>,

    /// Places (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub places: Vec<String>,

    /// Archetypes (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub archetypes: Vec<String>,

    /// Dream type (e.g. lucid, nightmare)
    #[arg(long = "type")]
    pub dream_type: Option<String>,

    /// Mark as a lucid dream
    #[arg(long)]
    pub lucid: bool,

    /// Mark as a recurring dream
    #[arg(long)]
    pub recurring: bool,
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Remove the cached insights
    Clear,
    /// Show whether the cached insights are fresh, stale or absent
    Status,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the override file path
    Path,
}

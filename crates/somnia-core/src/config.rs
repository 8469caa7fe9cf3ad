//! Runtime configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/somnia/config/somnia.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Keys missing from either file take their built-in defaults, so an override
//! only needs the values it changes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/somnia.toml");

/// Insight cache and narrative request settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    /// Hours a generated payload stays fresh
    pub ttl_hours: u64,
    /// Upper bound on one narrative generator call
    pub generator_timeout_secs: u64,
    /// Most recent records included in the digest sent to the generator
    pub digest_limit: usize,
    /// Characters of content kept per digest entry
    pub excerpt_chars: usize,
    /// Most recent quality points sent to the generator
    pub trend_points: usize,
    /// Entries per distribution sent to the generator
    pub top_n: usize,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            ttl_hours: 24,
            generator_timeout_secs: 60,
            digest_limit: 20,
            excerpt_chars: 200,
            trend_points: 30,
            top_n: 8,
        }
    }
}

impl InsightsConfig {
    pub fn ttl(&self) -> TimeDelta {
        i64::try_from(self.ttl_hours)
            .ok()
            .and_then(TimeDelta::try_hours)
            .unwrap_or(TimeDelta::MAX)
    }

    pub fn generator_timeout(&self) -> Duration {
        Duration::from_secs(self.generator_timeout_secs)
    }
}

/// Analytics engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Trailing window for the quality trend moving average
    pub moving_average_window: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            moving_average_window: crate::analytics::timeseries::DEFAULT_WINDOW,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SomniaConfig {
    pub insights: InsightsConfig,
    pub analytics: AnalyticsConfig,
}

impl SomniaConfig {
    /// Load from the default override location, else the embedded defaults
    pub fn load() -> Result<Self> {
        match default_config_path() {
            Some(path) => Self::load_from(&path),
            None => parse_config(DEFAULT_CONFIG),
        }
    }

    /// Load from `path` if it exists, else the embedded defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
            tracing::debug!(path = %path.display(), "Loaded config override");
            parse_config(&content)
        } else {
            parse_config(DEFAULT_CONFIG)
        }
    }

    /// Embedded defaults only
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    /// Render as TOML (for `somnia config`)
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("somnia").join("config").join("somnia.toml"))
}

fn parse_config(content: &str) -> Result<SomniaConfig> {
    let config: SomniaConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    if config.analytics.moving_average_window == 0 {
        return Err(Error::Config(
            "analytics.moving_average_window must be at least 1".to_string(),
        ));
    }

    Ok(config)
}

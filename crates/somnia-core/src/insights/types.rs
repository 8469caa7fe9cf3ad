//! Insight payload and cache types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a payload's text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightSource {
    /// Written by the narrative generator
    Generated,
    /// Synthesized locally from canned guidance
    Placeholder,
}

impl InsightSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generated => "generated",
            Self::Placeholder => "placeholder",
        }
    }
}

impl fmt::Display for InsightSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One supporting observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubInsight {
    pub title: String,
    pub content: String,
    /// Which part of the analytics this draws on (e.g. "emotions", "themes")
    pub source: String,
}

impl SubInsight {
    pub fn new(title: impl Into<String>, content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            source: source.into(),
        }
    }
}

/// The journal-wide narrative insight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightPayload {
    pub main_insight: String,
    /// Never empty
    pub sub_insights: Vec<SubInsight>,
    pub pattern: String,
    pub suggestion: String,
    pub next_focus: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub dream_count: usize,
    pub source: InsightSource,
}

/// Blob stored under the payload cache key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedInsight {
    pub payload: InsightPayload,
    pub generated_at: DateTime<Utc>,
}

/// Cache state as seen by a reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightState {
    /// Payload present and within the TTL
    Fresh,
    /// Payload present but expired, unstamped, or invalidated by a record event
    Stale,
    /// No usable payload
    Absent,
}

impl fmt::Display for InsightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Fresh => "fresh",
            Self::Stale => "stale",
            Self::Absent => "absent",
        };
        write!(f, "{}", s)
    }
}

/// Fields parsed from a narrative generator response
///
/// Every field may be missing; the orchestrator fills gaps from the
/// placeholder payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedInsight {
    pub main_insight: Option<String>,
    pub sub_insights: Vec<SubInsight>,
    pub pattern: Option<String>,
    pub suggestion: Option<String>,
    pub next_focus: Vec<String>,
}

impl GeneratedInsight {
    /// Merge onto `defaults`, marking the result as generated
    pub fn backfill(self, defaults: InsightPayload) -> InsightPayload {
        InsightPayload {
            main_insight: self.main_insight.unwrap_or(defaults.main_insight),
            sub_insights: if self.sub_insights.is_empty() {
                defaults.sub_insights
            } else {
                self.sub_insights
            },
            pattern: self.pattern.unwrap_or(defaults.pattern),
            suggestion: self.suggestion.unwrap_or(defaults.suggestion),
            next_focus: if self.next_focus.is_empty() {
                defaults.next_focus
            } else {
                self.next_focus
            },
            timestamp: defaults.timestamp,
            dream_count: defaults.dream_count,
            source: InsightSource::Generated,
        }
    }
}

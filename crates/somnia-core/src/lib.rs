//! Somnia Core Library
//!
//! Shared functionality for the Somnia dream journal:
//! - Database access, migrations and the record event channel
//! - Date normalization for heterogeneous stored dates
//! - Analytics engines (distributions, quality trend, period frequency,
//!   weekday and time-of-day patterns, summary KPIs)
//! - Insight orchestrator with a TTL cache and placeholder fallbacks
//! - Pluggable local AI backends (Ollama, OpenAI-compatible servers)
//! - Prompt library for customizable AI prompts
//! - Journal JSON import/export

pub mod ai;
pub mod analytics;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod export;
pub mod insights;
pub mod models;
pub mod outcome;
pub mod prompts;

/// Test utilities including record builders and a mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIClient, MockBackend, MockBehavior, NarrativeBackend, OllamaBackend, OpenAICompatibleBackend,
};
pub use analytics::{AnalyticsSnapshot, Dimension, Period, SlotTable, TimeSlot};
pub use config::{AnalyticsConfig, InsightsConfig, SomniaConfig};
pub use db::Database;
pub use error::{Error, Result};
pub use export::{ImportStats, JournalExport};
pub use insights::{
    InsightOrchestrator, InsightPayload, InsightSource, InsightState, JournalStore, SubInsight,
};
pub use models::{
    AnalyticsSummary, DateInput, DreamPatch, DreamRecord, FrequencyDatum, NewDream, QualityPoint,
    RecordEvent,
};
pub use outcome::Outcome;
pub use prompts::{Prompt, PromptId, PromptLibrary};

//! Insight payloads and their orchestration
//!
//! The orchestrator combines analytics outputs with a bounded digest of
//! recent dreams, asks a narrative backend for an interpretation, and caches
//! the result. It always yields a usable payload: sparse journals get local
//! guidance, and generator failures fall back to the same placeholder.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use somnia_core::{AIClient, Database, InsightOrchestrator, SomniaConfig};
//!
//! let orchestrator = InsightOrchestrator::new(db, AIClient::from_env(), SomniaConfig::load()?);
//! let outcome = orchestrator.get_insights().await;
//! println!("{}", outcome.value().main_insight);
//! ```

pub mod digest;
pub mod orchestrator;
pub mod placeholder;
pub mod types;

pub use digest::{DreamDigest, NarrativeRequest};
pub use orchestrator::{InsightOrchestrator, JournalStore, PAYLOAD_KEY, TIMESTAMP_KEY};
pub use placeholder::{placeholder_payload, PlaceholderTier, ESTABLISHED_THRESHOLD};
pub use types::{
    CachedInsight, GeneratedInsight, InsightPayload, InsightSource, InsightState, SubInsight,
};

//! Mock backend for testing
//!
//! Produces insights without a running model server. The behavior is
//! configurable so tests can exercise the orchestrator's fallback paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::insights::{GeneratedInsight, NarrativeRequest, SubInsight};
use crate::models::NO_DATA;

use super::parsing::parse_insight_response;
use super::NarrativeBackend;

/// What the mock does when asked for insights
#[derive(Debug, Clone, Default)]
pub enum MockBehavior {
    /// Build a short insight from the request's summary
    #[default]
    Echo,
    /// Parse this text as if a model had returned it
    Raw(String),
    /// Fail with a generation error
    Fail,
    /// Sleep, then echo
    Delay(Duration),
}

/// Mock narrative backend
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    pub behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Healthy echo backend
    pub fn new() -> Self {
        Self::with_behavior(MockBehavior::Echo)
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            healthy: true,
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Number of `generate_insights` calls so far (shared across clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn echo(request: &NarrativeRequest) -> GeneratedInsight {
        let summary = &request.summary;
        let emotion = Some(summary.top_emotion.as_str()).filter(|e| *e != NO_DATA);

        GeneratedInsight {
            main_insight: Some(match emotion {
                Some(e) => format!("Across {} dreams, {} leads.", request.dream_count, e),
                None => format!("Across {} dreams, no emotion leads yet.", request.dream_count),
            }),
            sub_insights: vec![SubInsight::new(
                "Activity",
                format!("Dreams were recorded on {} days.", summary.recorded_days),
                "summary",
            )],
            pattern: None,
            suggestion: Some("Mock suggestion".to_string()),
            next_focus: Vec::new(),
        }
    }
}

#[async_trait]
impl NarrativeBackend for MockBackend {
    async fn generate_insights(&self, request: &NarrativeRequest) -> Result<GeneratedInsight> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            MockBehavior::Echo => Ok(Self::echo(request)),
            MockBehavior::Raw(text) => parse_insight_response(text),
            MockBehavior::Fail => Err(Error::Generation("mock generator failure".into())),
            MockBehavior::Delay(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(Self::echo(request))
            }
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

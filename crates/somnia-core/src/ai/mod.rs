//! Pluggable narrative generator backends
//!
//! The insight orchestrator treats the language model as an external
//! collaborator reached through one operation: turn a [`NarrativeRequest`]
//! into a [`GeneratedInsight`]. All backends run against local or
//! self-hosted servers.
//!
//! # Architecture
//!
//! - `NarrativeBackend` trait: the interface every backend implements
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (ollama, openai_compatible, mock). Default: ollama
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)
//! - `OPENAI_COMPATIBLE_HOST`: Server URL (required for openai_compatible backend)
//! - `OPENAI_COMPATIBLE_MODEL`: Model name (default: gpt-3.5-turbo)
//! - `OPENAI_COMPATIBLE_API_KEY`: API key if required (optional)

mod mock;
mod ollama;
mod openai_compatible;
pub mod parsing;

pub use mock::{MockBackend, MockBehavior};
pub use ollama::OllamaBackend;
pub use openai_compatible::OpenAICompatibleBackend;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::insights::{GeneratedInsight, NarrativeRequest};
use crate::prompts::{PromptId, PromptLibrary};

/// Interface for narrative generator backends
#[async_trait]
pub trait NarrativeBackend: Send + Sync {
    /// Produce journal insights for the aggregated request
    async fn generate_insights(&self, request: &NarrativeRequest) -> Result<GeneratedInsight>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Model name (for logging)
    fn model(&self) -> &str;

    /// Host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without `Box<dyn>`.
#[derive(Clone)]
pub enum AIClient {
    Ollama(OllamaBackend),
    /// Any server speaking the OpenAI chat completions API
    OpenAICompatible(OpenAICompatibleBackend),
    Mock(MockBackend),
}

impl AIClient {
    /// Create a client from environment variables
    ///
    /// Returns None if the selected backend's host variable is not set.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("AI_BACKEND").unwrap_or_else(|_| "ollama".to_string());

        match backend.to_lowercase().as_str() {
            "ollama" => OllamaBackend::from_env().map(AIClient::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                OpenAICompatibleBackend::from_env().map(AIClient::OpenAICompatible)
            }
            "mock" => Some(AIClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown AI_BACKEND, falling back to ollama");
                OllamaBackend::from_env().map(AIClient::Ollama)
            }
        }
    }

    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Backend name (for display)
    pub fn kind(&self) -> &'static str {
        match self {
            AIClient::Ollama(_) => "ollama",
            AIClient::OpenAICompatible(_) => "openai_compatible",
            AIClient::Mock(_) => "mock",
        }
    }
}

#[async_trait]
impl NarrativeBackend for AIClient {
    async fn generate_insights(&self, request: &NarrativeRequest) -> Result<GeneratedInsight> {
        match self {
            AIClient::Ollama(b) => b.generate_insights(request).await,
            AIClient::OpenAICompatible(b) => b.generate_insights(request).await,
            AIClient::Mock(b) => b.generate_insights(request).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}

/// System and user text for an insight request
pub(crate) struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

/// Render the insight prompt shared by the HTTP backends
pub(crate) fn render_insight_prompt(
    prompts: &Arc<RwLock<PromptLibrary>>,
    request: &NarrativeRequest,
) -> Result<RenderedPrompt> {
    let mut vars = HashMap::new();
    vars.insert("dream_count", request.dream_count.to_string());
    vars.insert("analytics", request.analytics_json()?);
    vars.insert("digest", request.digest_json()?);

    let mut prompts = prompts
        .write()
        .map_err(|_| Error::Generation("Failed to acquire prompt library lock".into()))?;
    let template = prompts.get(PromptId::GenerateInsights)?;

    Ok(RenderedPrompt {
        system: template.render_system(&vars),
        user: template.render_user(&vars),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SomniaConfig;
    use crate::test_utils::DreamBuilder;

    #[test]
    fn test_render_insight_prompt() {
        let prompts = Arc::new(RwLock::new(PromptLibrary::embedded_only()));
        let records = vec![
            DreamBuilder::new().date("2024-06-01").title("Lighthouse").build(),
            DreamBuilder::new().date("2024-06-02").title("Library").build(),
        ];
        let request = NarrativeRequest::build(&records, &SomniaConfig::default());

        let rendered = render_insight_prompt(&prompts, &request).unwrap();
        assert!(rendered.system.contains("mainInsight"));
        assert!(rendered.user.contains("The journal holds 2 dreams."));
        assert!(rendered.user.contains("Lighthouse"));
        assert!(!rendered.user.contains("{{"));
    }

    #[tokio::test]
    async fn test_client_delegates_to_mock() {
        let client = AIClient::mock();
        assert_eq!(client.kind(), "mock");
        assert!(client.health_check().await);

        let records = vec![
            DreamBuilder::new().emotions(&["awe"]).build(),
            DreamBuilder::new().emotions(&["awe"]).build(),
        ];
        let request = NarrativeRequest::build(&records, &SomniaConfig::default());
        let generated = client.generate_insights(&request).await.unwrap();
        assert!(generated.main_insight.is_some());
    }
}

//! Ollama backend implementation
//!
//! HTTP client for the Ollama `/api/generate` endpoint. Requests JSON output
//! (`format: "json"`) and passes the prompt's system section separately.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::insights::{GeneratedInsight, NarrativeRequest};
use crate::prompts::PromptLibrary;

use super::parsing::parse_insight_response;
use super::{render_insight_prompt, NarrativeBackend};

/// Ollama backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
    prompts: Arc<RwLock<PromptLibrary>>,
}

impl OllamaBackend {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self::with_prompts(base_url, model, PromptLibrary::new())
    }

    /// Create with an explicit prompt library (e.g. embedded only, for tests)
    pub fn with_prompts(base_url: &str, model: &str, prompts: PromptLibrary) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            prompts: Arc::new(RwLock::new(prompts)),
        }
    }

    /// Same server, different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    /// Create from `OLLAMA_HOST` / `OLLAMA_MODEL`
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Some(Self::new(&host, &model))
    }
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    format: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl NarrativeBackend for OllamaBackend {
    async fn generate_insights(&self, request: &NarrativeRequest) -> Result<GeneratedInsight> {
        let prompt = render_insight_prompt(&self.prompts, request)?;

        let body = OllamaRequest {
            model: &self.model,
            system: &prompt.system,
            prompt: &prompt.user,
            format: "json",
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("Ollama error {}: {}", status, text)));
        }

        let ollama_response: OllamaResponse = response.json().await?;
        debug!(model = %self.model, "Ollama insight response: {}", ollama_response.response);

        parse_insight_response(&ollama_response.response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

//! Test utilities for somnia-core
//!
//! Provides a fluent [`DreamBuilder`] for analytics fixtures and a mock
//! Ollama server for exercising the HTTP narrative backend end to end.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::models::{DateInput, DreamElements, DreamRecord, Emotions};

/// Builder for [`DreamRecord`] fixtures
///
/// Unset fields stay empty; the dream date stays `None` unless given.
#[derive(Debug, Clone)]
pub struct DreamBuilder {
    record: DreamRecord,
}

impl Default for DreamBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DreamBuilder {
    pub fn new() -> Self {
        Self {
            record: DreamRecord {
                id: 0,
                dream_date: None,
                title: String::new(),
                content: String::new(),
                interpretation: None,
                sleep_quality: None,
                dream_clarity: None,
                emotions: Emotions::default(),
                elements: DreamElements::default(),
                symbols: Vec::new(),
                themes: Vec::new(),
                tags: Vec::new(),
                personal_notes: None,
                is_recurring: false,
                is_lucid: false,
                dream_type: None,
                created_at: None,
                updated_at: None,
            },
        }
    }

    pub fn id(mut self, id: i64) -> Self {
        self.record.id = id;
        self
    }

    /// Raw date text, resolved later by the date normalizer
    pub fn date(mut self, raw: &str) -> Self {
        self.record.dream_date = Some(DateInput::from(raw));
        self
    }

    pub fn date_input(mut self, input: DateInput) -> Self {
        self.record.dream_date = Some(input);
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.record.title = title.to_string();
        self
    }

    pub fn content(mut self, content: &str) -> Self {
        self.record.content = content.to_string();
        self
    }

    pub fn clarity(mut self, value: u8) -> Self {
        self.record.dream_clarity = Some(value);
        self
    }

    pub fn sleep(mut self, value: u8) -> Self {
        self.record.sleep_quality = Some(value);
        self
    }

    pub fn emotions(mut self, names: &[&str]) -> Self {
        self.record.emotions.during_dream = strings(names);
        self
    }

    pub fn after_emotion(mut self, name: &str) -> Self {
        self.record.emotions.after_dream = Some(name.to_string());
        self
    }

    pub fn themes(mut self, names: &[&str]) -> Self {
        self.record.themes = strings(names);
        self
    }

    /// Structured symbols (`elements.symbols`)
    pub fn symbols(mut self, names: &[&str]) -> Self {
        self.record.elements.symbols = strings(names);
        self
    }

    /// Flat symbol list used by older records
    pub fn legacy_symbols(mut self, names: &[&str]) -> Self {
        self.record.symbols = strings(names);
        self
    }

    /// Archetype tags
    pub fn tags(mut self, names: &[&str]) -> Self {
        self.record.tags = strings(names);
        self
    }

    pub fn characters(mut self, names: &[&str]) -> Self {
        self.record.elements.characters = strings(names);
        self
    }

    pub fn places(mut self, names: &[&str]) -> Self {
        self.record.elements.places = strings(names);
        self
    }

    pub fn dream_type(mut self, dream_type: &str) -> Self {
        self.record.dream_type = Some(dream_type.to_string());
        self
    }

    pub fn lucid(mut self) -> Self {
        self.record.is_lucid = true;
        self
    }

    pub fn recurring(mut self) -> Self {
        self.record.is_recurring = true;
        self
    }

    pub fn build(self) -> DreamRecord {
        self.record
    }
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Insight JSON returned by the mock server unless told otherwise
pub const CANNED_INSIGHT: &str = r#"{
  "mainInsight": "Water and flight keep returning in your recent dreams.",
  "subInsights": [
    {"title": "Recurring setting", "content": "Most dreams take place near open water.", "source": "themes"},
    {"title": "Mood", "content": "Wonder outweighs fear this month.", "source": "emotions"}
  ],
  "pattern": "Vivid dreams cluster on weekends.",
  "suggestion": "Note the weather in your next water dream.",
  "nextFocus": ["water", "flight"]
}"#;

/// What `/api/generate` answers with
#[derive(Debug, Clone)]
enum GenerateMode {
    Respond(String),
    Fail(StatusCode),
}

#[derive(Clone)]
struct ServerState {
    mode: GenerateMode,
    generate_calls: Arc<AtomicUsize>,
}

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    generate_calls: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port, answering with [`CANNED_INSIGHT`]
    pub async fn start() -> Self {
        Self::start_with_response(CANNED_INSIGHT).await
    }

    /// Start a server whose model "says" `response`
    pub async fn start_with_response(response: &str) -> Self {
        Self::spawn(GenerateMode::Respond(response.to_string())).await
    }

    /// Start a server whose generate endpoint returns HTTP 500
    pub async fn start_failing() -> Self {
        Self::spawn(GenerateMode::Fail(StatusCode::INTERNAL_SERVER_ERROR)).await
    }

    async fn spawn(mode: GenerateMode) -> Self {
        let generate_calls = Arc::new(AtomicUsize::new(0));
        let state = ServerState {
            mode,
            generate_calls: generate_calls.clone(),
        };

        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            generate_calls,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of `/api/generate` requests served
    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            modified_at: "2024-01-01T00:00:00Z".to_string(),
            size: 4_000_000_000,
        }],
    })
}

/// Ollama generate endpoint
async fn handle_generate(
    State(state): State<ServerState>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    state.generate_calls.fetch_add(1, Ordering::SeqCst);

    match state.mode {
        GenerateMode::Respond(response) => Json(GenerateResponse {
            model: request.model,
            response,
            done: true,
        })
        .into_response(),
        GenerateMode::Fail(status) => (status, "model crashed").into_response(),
    }
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    #[allow(dead_code)]
    prompt: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

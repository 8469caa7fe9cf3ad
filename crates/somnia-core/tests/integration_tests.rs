//! Integration tests for somnia-core
//!
//! These tests exercise the full journal → analytics → insights workflow
//! against a real database and a mock Ollama server.

use somnia_core::{
    analytics::{frequency_by_period, AnalyticsSnapshot, Period},
    db::Database,
    insights::{InsightOrchestrator, InsightSource, InsightState, PAYLOAD_KEY},
    models::NewDream,
    prompts::PromptLibrary,
    test_utils::MockOllamaServer,
    AIClient, AnalyticsConfig, OllamaBackend, SomniaConfig,
};

/// Journal export from an older version: mixed date formats, legacy symbols,
/// one unreadable entry
fn legacy_journal() -> &'static str {
    r#"{
  "dreams": [
    {
      "title": "Flooded house",
      "dreamDate": "2024-01-01T04:30:00Z",
      "dreamClarity": 4,
      "sleepQuality": 3,
      "emotions": {"duringDream": ["fear", "wonder"], "afterDream": "relief"},
      "themes": ["water"],
      "symbols": ["door"],
      "dreamType": "nightmare"
    },
    {
      "title": "Flying over the city",
      "dreamDate": 1704326400000,
      "dreamClarity": 5,
      "emotions": {"duringDream": ["joy"]},
      "elements": {"symbols": ["Door", "wings"]},
      "themes": ["flight", "Water"],
      "dreamType": "lucid"
    },
    {
      "title": "Library maze",
      "dreamDate": "1704787200000",
      "emotions": {"duringDream": ["wonder"]},
      "themes": ["water"]
    },
    {
      "title": "Unknown night",
      "dreamDate": "sometime last week"
    },
    "corrupted entry"
  ]
}"#
}

fn ollama_client(server: &MockOllamaServer) -> AIClient {
    AIClient::Ollama(OllamaBackend::with_prompts(
        &server.url(),
        "llama3.2",
        PromptLibrary::embedded_only(),
    ))
}

fn save(db: &Database, title: &str, date: &str) -> i64 {
    db.save_dream(&NewDream {
        title: title.to_string(),
        dream_date: Some(date.into()),
        dream_clarity: Some(3),
        themes: vec!["water".to_string()],
        ..Default::default()
    })
    .expect("Failed to save dream")
}

// =============================================================================
// Import + Analytics
// =============================================================================

#[test]
fn test_import_legacy_journal_and_analyze() {
    let db = Database::in_memory().expect("Failed to create in-memory database");

    let stats = db.import_json_str(legacy_journal()).expect("Import failed");
    assert_eq!(stats.imported, 4);
    assert_eq!(stats.skipped, 1);

    let dreams = db.list_dreams().unwrap();
    let first_three = &dreams[..3];
    let snapshot = AnalyticsSnapshot::compute(first_three, &AnalyticsConfig::default());

    assert_eq!(snapshot.summary.total_dreams, 3);
    assert!((snapshot.summary.avg_quality - 4.5).abs() < 1e-12);
    assert_eq!(snapshot.summary.top_emotion, "wonder");
    assert_eq!(snapshot.summary.top_theme, "water");
    assert_eq!(snapshot.summary.last_dream_date, "2024-01-09");
    assert_eq!(snapshot.summary.dream_types.get("normal"), Some(&1));

    // Case-insensitive counting keeps the first spelling
    let water = snapshot.themes.iter().find(|d| d.name == "water").unwrap();
    assert_eq!(water.count, 3);
    let door = snapshot.symbols.iter().find(|d| d.name == "door").unwrap();
    assert_eq!(door.count, 2);

    // 2024-01-01 and 2024-01-04 share a week, 2024-01-09 starts the next
    let weekly = frequency_by_period(first_three, Period::Week);
    let totals: Vec<_> = weekly
        .iter()
        .filter(|d| d.is_total())
        .map(|d| (d.period.as_str(), d.count))
        .collect();
    assert_eq!(totals, vec![("2024-W01", 2), ("2024-W02", 1)]);

    // The unparseable date still yields a usable record
    let snapshot = AnalyticsSnapshot::compute(&dreams, &AnalyticsConfig::default());
    assert_eq!(snapshot.summary.total_dreams, 4);
    assert_eq!(
        snapshot.patterns.weekdays.iter().map(|w| w.count).sum::<usize>(),
        4
    );
}

// =============================================================================
// Insight Orchestrator
// =============================================================================

#[tokio::test]
async fn test_insights_end_to_end() {
    let db = Database::in_memory().unwrap();
    let server = MockOllamaServer::start().await;
    let orchestrator =
        InsightOrchestrator::new(db.clone(), Some(ollama_client(&server)), SomniaConfig::default());

    // Sparse journal: local placeholder, no model call
    save(&db, "Rain", "2024-05-01");
    let outcome = orchestrator.get_insights().await;
    assert_eq!(outcome.status(), "placeholder");
    assert_eq!(server.generate_calls(), 0);

    save(&db, "Boat", "2024-05-02");
    assert_eq!(orchestrator.state(), InsightState::Stale);

    let outcome = orchestrator.get_insights().await;
    assert!(outcome.is_nominal());
    let payload = outcome.value();
    assert_eq!(payload.source, InsightSource::Generated);
    assert_eq!(payload.dream_count, 2);
    assert_eq!(
        payload.main_insight,
        "Water and flight keep returning in your recent dreams."
    );
    assert_eq!(payload.next_focus, vec!["water", "flight"]);
    assert_eq!(server.generate_calls(), 1);

    // Served from cache
    let cached = orchestrator.get_insights().await;
    assert_eq!(cached.value(), payload);
    assert_eq!(server.generate_calls(), 1);

    // Persisted in the journal database
    let raw = db.get_cache_value(PAYLOAD_KEY).unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["payload"]["source"], "generated");
    assert!(json["generatedAt"].is_string());
}

#[tokio::test]
async fn test_failing_model_falls_back_to_placeholder() {
    let db = Database::in_memory().unwrap();
    save(&db, "Rain", "2024-05-01");
    save(&db, "Boat", "2024-05-02");

    let server = MockOllamaServer::start_failing().await;
    let orchestrator =
        InsightOrchestrator::new(db.clone(), Some(ollama_client(&server)), SomniaConfig::default());

    let outcome = orchestrator.get_insights().await;
    assert!(outcome.is_degraded());
    assert!(outcome.cause().unwrap().contains("500"));
    assert_eq!(outcome.value().source, InsightSource::Placeholder);
    assert!(!outcome.value().sub_insights.is_empty());

    // The fallback is cached; no synchronous retry
    assert_eq!(orchestrator.state(), InsightState::Fresh);
    orchestrator.get_insights().await;
    assert_eq!(server.generate_calls(), 1);
}

#[tokio::test]
async fn test_malformed_model_output_falls_back() {
    let db = Database::in_memory().unwrap();
    save(&db, "Rain", "2024-05-01");
    save(&db, "Boat", "2024-05-02");

    let server = MockOllamaServer::start_with_response("I dream of electric sheep.").await;
    let orchestrator =
        InsightOrchestrator::new(db.clone(), Some(ollama_client(&server)), SomniaConfig::default());

    let outcome = orchestrator.get_insights().await;
    assert!(outcome.is_degraded());
    assert_eq!(outcome.value().source, InsightSource::Placeholder);
    assert_eq!(outcome.value().dream_count, 2);
}

#[tokio::test]
async fn test_partial_model_output_is_backfilled() {
    let db = Database::in_memory().unwrap();
    save(&db, "Rain", "2024-05-01");
    save(&db, "Boat", "2024-05-02");

    let server =
        MockOllamaServer::start_with_response(r#"{"mainInsight": "Rain and boats."}"#).await;
    let orchestrator =
        InsightOrchestrator::new(db.clone(), Some(ollama_client(&server)), SomniaConfig::default());

    let outcome = orchestrator.get_insights().await;
    assert!(outcome.is_nominal());
    let payload = outcome.value();
    assert_eq!(payload.main_insight, "Rain and boats.");
    assert!(!payload.sub_insights.is_empty());
    assert!(!payload.suggestion.is_empty());
    assert!(!payload.next_focus.is_empty());
}

#[tokio::test]
async fn test_clear_cache_and_refresh() {
    let db = Database::in_memory().unwrap();
    save(&db, "Rain", "2024-05-01");
    save(&db, "Boat", "2024-05-02");

    let server = MockOllamaServer::start().await;
    let orchestrator =
        InsightOrchestrator::new(db.clone(), Some(ollama_client(&server)), SomniaConfig::default());

    orchestrator.get_insights().await;
    orchestrator.clear_cache().unwrap();
    assert_eq!(orchestrator.state(), InsightState::Absent);

    let outcome = orchestrator.refresh().await;
    assert!(outcome.is_nominal());
    assert_eq!(server.generate_calls(), 2);
}

#[tokio::test]
async fn test_record_saved_by_another_process_marks_insights_stale() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("journal.db");
    let path = path.to_string_lossy();

    // Each handle stands in for a separate `somnia` invocation
    let open = || Database::new_unencrypted(&path).unwrap();
    let orchestrator_for =
        |db: Database| InsightOrchestrator::new(db, Some(AIClient::mock()), SomniaConfig::default());

    let first = open();
    save(&first, "Rain", "2024-05-01");
    save(&first, "Boat", "2024-05-02");

    let outcome = orchestrator_for(open()).get_insights().await;
    assert!(outcome.is_nominal());
    assert_eq!(outcome.value().dream_count, 2);
    assert_eq!(orchestrator_for(open()).state(), InsightState::Fresh);

    save(&open(), "Lighthouse", "2024-05-03");

    let later = orchestrator_for(open());
    assert_eq!(later.state(), InsightState::Stale);
    let outcome = later.get_insights().await;
    assert!(outcome.is_nominal());
    assert_eq!(outcome.value().dream_count, 3);
}

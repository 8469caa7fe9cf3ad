//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use somnia_core::ai::{AIClient, MockBackend, OllamaBackend};
use somnia_core::analytics::{Dimension, Period};
use somnia_core::config::SomniaConfig;
use somnia_core::db::Database;
use somnia_core::insights::{InsightOrchestrator, InsightState, PAYLOAD_KEY};
use somnia_core::models::DateInput;

use crate::cli::AddArgs;
use crate::commands::{self, truncate};

fn setup_test_db() -> Database {
    Database::in_memory().unwrap()
}

fn add_args(title: &str, date: &str) -> AddArgs {
    AddArgs {
        title: title.to_string(),
        date: Some(date.to_string()),
        clarity: Some(4),
        sleep: Some(3),
        emotions: vec!["wonder".to_string()],
        themes: vec!["water".to_string()],
        ..Default::default()
    }
}

/// Database with a handful of dreams across two months
fn seeded_db() -> Database {
    let db = setup_test_db();
    commands::cmd_add(&db, add_args("Flooded house", "2024-01-01T04:30:00Z")).unwrap();
    commands::cmd_add(&db, add_args("Flying", "2024-01-04")).unwrap();
    commands::cmd_add(
        &db,
        AddArgs {
            dream_type: Some("nightmare".to_string()),
            ..add_args("Chased", "2024-02-10T23:15:00Z")
        },
    )
    .unwrap();
    db
}

fn mock_orchestrator(db: &Database) -> InsightOrchestrator<Database> {
    InsightOrchestrator::new(db.clone(), Some(AIClient::mock()), SomniaConfig::default())
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a dream about the sea", 10), "a dream...");
    // Multi-byte characters are never split
    assert_eq!(truncate("über die Brücke", 8), "über ...");
}

// ========== Journal Command Tests ==========

#[test]
fn test_cmd_add_stores_fields() {
    let db = setup_test_db();
    let id = commands::cmd_add(
        &db,
        AddArgs {
            after: Some("calm".to_string()),
            symbols: vec!["key".to_string()],
            archetypes: vec!["Trickster".to_string()],
            lucid: true,
            ..add_args("Locked door", "2024-03-01")
        },
    )
    .unwrap();

    let dream = db.get_dream(id).unwrap().unwrap();
    assert_eq!(dream.title, "Locked door");
    assert_eq!(dream.dream_date, Some(DateInput::Text("2024-03-01".to_string())));
    assert_eq!(dream.dream_clarity, Some(4));
    assert_eq!(dream.emotions.after_dream.as_deref(), Some("calm"));
    assert_eq!(dream.elements.symbols, vec!["key"]);
    assert_eq!(dream.tags, vec!["Trickster"]);
    assert!(dream.is_lucid);
}

#[test]
fn test_cmd_add_defaults_date_to_now() {
    let db = setup_test_db();
    let id = commands::cmd_add(
        &db,
        AddArgs {
            title: "Undated".to_string(),
            ..Default::default()
        },
    )
    .unwrap();

    let dream = db.get_dream(id).unwrap().unwrap();
    assert!(matches!(dream.dream_date, Some(DateInput::Instant(_))));
}

#[test]
fn test_cmd_add_rejects_unreadable_date() {
    let db = setup_test_db();
    let result = commands::cmd_add(&db, add_args("Lost", "last tuesday"));
    assert!(result.is_err());
    assert_eq!(db.count_dreams().unwrap(), 0);
}

#[test]
fn test_cmd_add_rejects_out_of_range_rating() {
    let db = setup_test_db();
    let result = commands::cmd_add(
        &db,
        AddArgs {
            clarity: Some(9),
            ..add_args("Blinding", "2024-03-01")
        },
    );
    assert!(result.is_err());
}

#[test]
fn test_cmd_list() {
    let db = seeded_db();
    assert!(commands::cmd_list(&db, 20).is_ok());
    assert!(commands::cmd_list(&db, 1).is_ok());
}

#[test]
fn test_cmd_list_empty() {
    let db = setup_test_db();
    assert!(commands::cmd_list(&db, 20).is_ok());
}

#[test]
fn test_cmd_show() {
    let db = seeded_db();
    assert!(commands::cmd_show(&db, 1).is_ok());
    assert!(commands::cmd_show(&db, 999).is_err());
}

#[test]
fn test_cmd_delete() {
    let db = seeded_db();
    assert!(commands::cmd_delete(&db, 1).is_ok());
    assert_eq!(db.count_dreams().unwrap(), 2);
    assert!(commands::cmd_delete(&db, 1).is_err());
}

// ========== Analytics Command Tests ==========

#[test]
fn test_cmd_stats() {
    let db = seeded_db();
    assert!(commands::cmd_stats(&db, false).is_ok());
    assert!(commands::cmd_stats(&db, true).is_ok());
}

#[test]
fn test_cmd_stats_empty_journal() {
    let db = setup_test_db();
    assert!(commands::cmd_stats(&db, false).is_ok());
}

#[test]
fn test_cmd_distribution() {
    let db = seeded_db();
    for dimension in Dimension::all() {
        assert!(commands::cmd_distribution(&db, *dimension, None).is_ok());
    }
    assert!(commands::cmd_distribution(&db, Dimension::Themes, Some(1)).is_ok());
}

#[test]
fn test_cmd_trend() {
    let db = seeded_db();
    assert!(commands::cmd_trend(&db, Some(2)).is_ok());
    assert!(commands::cmd_trend(&db, Some(10)).is_ok());
}

#[test]
fn test_cmd_trend_rejects_zero_window() {
    let db = seeded_db();
    assert!(commands::cmd_trend(&db, Some(0)).is_err());
}

#[test]
fn test_cmd_frequency() {
    let db = seeded_db();
    assert!(commands::cmd_frequency(&db, Period::Week).is_ok());
    assert!(commands::cmd_frequency(&db, Period::Month).is_ok());
}

#[test]
fn test_cmd_patterns() {
    let db = seeded_db();
    assert!(commands::cmd_patterns(&db).is_ok());

    let empty = setup_test_db();
    assert!(commands::cmd_patterns(&empty).is_ok());
}

// ========== Import/Export Command Tests ==========

#[test]
fn test_cmd_export_then_import() {
    let db = seeded_db();
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("journal.json");

    commands::cmd_export(&db, &path).unwrap();
    assert!(path.exists());

    let other = setup_test_db();
    commands::cmd_import(&other, &path).unwrap();

    let titles: Vec<_> = other
        .list_dreams()
        .unwrap()
        .into_iter()
        .map(|d| d.title)
        .collect();
    assert_eq!(titles, vec!["Flooded house", "Flying", "Chased"]);
}

#[test]
fn test_cmd_import_skips_bad_entries() {
    let db = setup_test_db();
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("dreams.json");
    std::fs::write(
        &path,
        r#"[{"title": "Ocean", "dreamDate": 1704067200000}, 42, "nope"]"#,
    )
    .unwrap();

    commands::cmd_import(&db, &path).unwrap();
    assert_eq!(db.count_dreams().unwrap(), 1);
}

#[test]
fn test_cmd_import_missing_file() {
    let db = setup_test_db();
    let result = commands::cmd_import(&db, std::path::Path::new("/nonexistent/dreams.json"));
    assert!(result.is_err());
}

#[test]
fn test_cmd_import_rejects_non_journal_json() {
    let db = setup_test_db();
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

    assert!(commands::cmd_import(&db, &path).is_err());
}

// ========== Insights Command Tests ==========

#[tokio::test]
async fn test_cmd_insights_generates_and_caches() {
    let db = seeded_db();
    let orchestrator = mock_orchestrator(&db);

    commands::cmd_insights(&orchestrator, false, false).await.unwrap();
    assert_eq!(orchestrator.state(), InsightState::Fresh);
    assert!(db.get_cache_value(PAYLOAD_KEY).unwrap().is_some());

    commands::cmd_insights(&orchestrator, false, true).await.unwrap();
    commands::cmd_insights(&orchestrator, true, false).await.unwrap();
}

#[tokio::test]
async fn test_cmd_insights_sparse_journal() {
    let db = setup_test_db();
    commands::cmd_add(&db, add_args("Only one", "2024-01-01")).unwrap();
    let orchestrator = mock_orchestrator(&db);

    assert!(commands::cmd_insights(&orchestrator, false, false).await.is_ok());
}

#[tokio::test]
async fn test_cmd_insights_without_backend() {
    let db = seeded_db();
    let orchestrator = InsightOrchestrator::new(db.clone(), None, SomniaConfig::default());

    assert!(commands::cmd_insights(&orchestrator, false, true).await.is_ok());
}

#[tokio::test]
async fn test_cmd_cache_clear_and_status() {
    let db = seeded_db();
    let orchestrator = mock_orchestrator(&db);

    commands::cmd_cache_status(&orchestrator).await.unwrap();
    commands::cmd_insights(&orchestrator, false, false).await.unwrap();
    commands::cmd_cache_status(&orchestrator).await.unwrap();

    commands::cmd_cache_clear(&orchestrator).unwrap();
    assert_eq!(orchestrator.state(), InsightState::Absent);
    assert!(db.get_cache_value(PAYLOAD_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_cmd_add_invalidates_cached_insights() {
    let db = seeded_db();
    let orchestrator = mock_orchestrator(&db);

    orchestrator.get_insights().await;
    assert_eq!(orchestrator.state(), InsightState::Fresh);

    commands::cmd_add(&db, add_args("New dream", "2024-02-11")).unwrap();
    assert_eq!(orchestrator.state(), InsightState::Stale);
}

#[tokio::test]
async fn test_backend_reachable() {
    let db = seeded_db();

    assert_eq!(commands::backend_reachable(&mock_orchestrator(&db)).await, Some(true));

    let down = InsightOrchestrator::new(
        db.clone(),
        Some(AIClient::Mock(MockBackend::unhealthy())),
        SomniaConfig::default(),
    );
    assert_eq!(commands::backend_reachable(&down).await, Some(false));
    commands::cmd_cache_status(&down).await.unwrap();

    let none = InsightOrchestrator::new(db.clone(), None, SomniaConfig::default());
    assert_eq!(commands::backend_reachable(&none).await, None);
    commands::cmd_cache_status(&none).await.unwrap();
}

#[tokio::test]
async fn test_cache_status_with_unreachable_ollama() {
    let db = seeded_db();
    let orchestrator = InsightOrchestrator::new(
        db.clone(),
        Some(AIClient::Ollama(OllamaBackend::new("http://127.0.0.1:9", "llama3.2"))),
        SomniaConfig::default(),
    );
    assert_eq!(commands::backend_reachable(&orchestrator).await, Some(false));
    assert!(commands::cmd_cache_status(&orchestrator).await.is_ok());
}

#[tokio::test]
async fn test_add_in_separate_invocation_refreshes_insights() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("journal.db");

    // Each open_db mirrors one `somnia` process
    let db = commands::open_db(&path, true).unwrap();
    commands::cmd_add(&db, add_args("Rain", "2024-05-01")).unwrap();
    commands::cmd_add(&db, add_args("Boat", "2024-05-02")).unwrap();
    drop(db);

    let first = mock_orchestrator(&commands::open_db(&path, true).unwrap());
    commands::cmd_insights(&first, false, false).await.unwrap();
    assert_eq!(first.state(), InsightState::Fresh);
    drop(first);

    let db = commands::open_db(&path, true).unwrap();
    commands::cmd_add(&db, add_args("Lighthouse", "2024-05-03")).unwrap();
    drop(db);

    let later = mock_orchestrator(&commands::open_db(&path, true).unwrap());
    assert_eq!(later.state(), InsightState::Stale);
    let outcome = later.get_insights().await;
    assert_eq!(outcome.value().dream_count, 3);
}

// ========== Database Tests ==========

#[test]
fn test_open_db_unencrypted_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("journal.db");

    let db = commands::open_db(&path, true).unwrap();
    commands::cmd_add(&db, add_args("Persisted", "2024-01-01")).unwrap();
    drop(db);

    let conn = rusqlite::Connection::open(&path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM dreams", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

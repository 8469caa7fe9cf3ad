//! Journal export and import
//!
//! Exports write a versioned JSON document. Imports accept that document or a
//! bare array of records, as written by older versions, and keep each
//! record's raw date representation.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::DreamRecord;

/// Format version written into exports
pub const EXPORT_VERSION: u32 = 1;

/// A complete journal export
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalExport {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub dreams: Vec<DreamRecord>,
}

/// Import statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    pub imported: usize,
    /// Entries that were not records (wrong shape or type)
    pub skipped: usize,
}

impl Database {
    /// Snapshot the whole journal
    pub fn export_journal(&self) -> Result<JournalExport> {
        Ok(JournalExport {
            version: EXPORT_VERSION,
            exported_at: Utc::now(),
            dreams: self.list_dreams()?,
        })
    }

    /// Write the journal to `path` as pretty JSON
    ///
    /// The file is written next to the target and renamed into place, so a
    /// failed export never leaves a truncated file behind.
    pub fn export_json(&self, path: &Path) -> Result<usize> {
        let export = self.export_journal()?;
        let json = serde_json::to_string_pretty(&export)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(json.as_bytes())?;
        file.persist(path).map_err(|e| Error::Io(e.error))?;

        info!(dreams = export.dreams.len(), path = %path.display(), "Exported journal");
        Ok(export.dreams.len())
    }

    /// Import records from a JSON file
    pub fn import_json(&self, path: &Path) -> Result<ImportStats> {
        let text = std::fs::read_to_string(path)?;
        self.import_json_str(&text)
    }

    /// Import records from JSON text
    ///
    /// Accepts `[record, ...]` or `{"dreams": [record, ...]}`. Entries that
    /// cannot be read as records are skipped and counted.
    pub fn import_json_str(&self, text: &str) -> Result<ImportStats> {
        let entries = match serde_json::from_str::<Value>(text)? {
            Value::Array(items) => items,
            Value::Object(mut fields) => match fields.remove("dreams") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(Error::InvalidData(
                        "Journal object has no \"dreams\" array".into(),
                    ))
                }
            },
            _ => {
                return Err(Error::InvalidData(
                    "Expected a JSON array of dreams or a journal export".into(),
                ))
            }
        };

        let mut dreams = Vec::with_capacity(entries.len());
        let mut skipped = 0;
        for (index, entry) in entries.into_iter().enumerate() {
            if !entry.is_object() {
                warn!(index, "Skipping journal entry that is not an object");
                skipped += 1;
                continue;
            }
            match serde_json::from_value::<DreamRecord>(entry) {
                Ok(dream) => dreams.push(dream),
                Err(e) => {
                    warn!(index, error = %e, "Skipping unreadable journal entry");
                    skipped += 1;
                }
            }
        }

        let imported = self.insert_dreams(&dreams)?;
        info!(imported, skipped, "Imported journal");
        Ok(ImportStats { imported, skipped })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateInput, NewDream};
    use tempfile::TempDir;

    #[test]
    fn test_import_keeps_entries_with_non_date_values() {
        let db = Database::in_memory().unwrap();
        let stats = db
            .import_json_str(
                r#"[
                    {"title": "Timestamp object", "dreamDate": {"seconds": 1709251200, "nanoseconds": 0}},
                    {"title": "Flag", "dreamDate": true},
                    {"title": "Plain", "dreamDate": "2024-03-01"}
                ]"#,
            )
            .unwrap();
        assert_eq!(stats, ImportStats { imported: 3, skipped: 0 });

        let dreams = db.list_dreams().unwrap();
        assert!(matches!(dreams[0].dream_date, Some(DateInput::Other(_))));
        assert_eq!(dreams[1].dream_date, Some(DateInput::Other(serde_json::json!(true))));

        // Non-dates resolve to the current day instead of failing
        let today = chrono::Utc::now().date_naive();
        assert!(dreams[0].dream_day() >= today - chrono::Duration::days(1));
        assert!(dreams[1].dream_day() >= today - chrono::Duration::days(1));
        assert_eq!(dreams[2].dream_day().to_string(), "2024-03-01");
    }

    #[test]
    fn test_export_import_preserves_dreams() {
        let db = Database::in_memory().unwrap();
        db.save_dream(&NewDream {
            title: "Tidal wave".to_string(),
            dream_date: Some(DateInput::from("2024-02-10")),
            themes: vec!["water".to_string()],
            sleep_quality: Some(2),
            ..Default::default()
        })
        .unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.json");
        assert_eq!(db.export_json(&path).unwrap(), 1);

        let other = Database::in_memory().unwrap();
        let stats = other.import_json(&path).unwrap();
        assert_eq!(stats, ImportStats { imported: 1, skipped: 0 });

        let dreams = other.list_dreams().unwrap();
        assert_eq!(dreams[0].title, "Tidal wave");
        assert_eq!(dreams[0].themes, vec!["water"]);
        assert_eq!(dreams[0].sleep_quality, Some(2));
        assert_eq!(dreams[0].dream_day().to_string(), "2024-02-10");
    }

    #[test]
    fn test_import_bare_array_with_mixed_dates() {
        let db = Database::in_memory().unwrap();
        let stats = db
            .import_json_str(
                r#"[
                    {"title": "iso", "dreamDate": "2024-03-01T06:30:00Z"},
                    {"title": "epoch", "dreamDate": 1709272800000},
                    {"title": "digits", "dreamDate": "1709272800000"},
                    {"title": "junk", "dreamDate": "last tuesday"},
                    "not a dream",
                    42
                ]"#,
            )
            .unwrap();

        assert_eq!(stats.imported, 4);
        assert_eq!(stats.skipped, 2);
        assert_eq!(db.count_dreams().unwrap(), 4);
    }

    #[test]
    fn test_import_rejects_other_shapes() {
        let db = Database::in_memory().unwrap();
        assert!(db.import_json_str("\"hello\"").is_err());
        assert!(db.import_json_str(r#"{"records": []}"#).is_err());
        assert!(db.import_json_str("not json").is_err());
    }

    #[test]
    fn test_export_document_shape() {
        let db = Database::in_memory().unwrap();
        let export = db.export_journal().unwrap();
        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["version"], 1);
        assert!(json["exportedAt"].is_string());
        assert_eq!(json["dreams"], Value::Array(Vec::new()));
    }
}

//! Database tests

use super::*;
use crate::models::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::{PAYLOAD_KEY, TIMESTAMP_KEY};
    use crate::test_utils::DreamBuilder;

    fn new_dream(title: &str) -> NewDream {
        NewDream {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        assert!(db.list_dreams().unwrap().is_empty());
        assert_eq!(db.count_dreams().unwrap(), 0);
    }

    #[test]
    fn test_schema_exists() {
        let db = Database::in_memory().unwrap();
        let conn = db.conn().unwrap();

        let result: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('dreams') WHERE name IN ('id', 'dream_date', 'emotions', 'elements', 'legacy_symbols', 'themes', 'tags', 'dream_type')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(result, 8, "dreams table should have 8 expected columns");

        let result: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('insight_cache') WHERE name IN ('key', 'value', 'updated_at')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(result, 3, "insight_cache table should have 3 expected columns");
    }

    #[test]
    fn test_dream_crud() {
        let db = Database::in_memory().unwrap();

        let id = db
            .save_dream(&NewDream {
                title: "Endless staircase".to_string(),
                content: "Climbing stairs that never end".to_string(),
                dream_date: Some(DateInput::from("2024-04-02T05:45:00Z")),
                dream_clarity: Some(4),
                emotions: Emotions {
                    during_dream: vec!["anxiety".to_string()],
                    after_dream: Some("relief".to_string()),
                },
                elements: DreamElements {
                    places: vec!["tower".to_string()],
                    ..Default::default()
                },
                themes: vec!["pursuit".to_string()],
                tags: vec!["Seeker".to_string()],
                is_recurring: true,
                ..Default::default()
            })
            .unwrap();
        assert!(id > 0);

        let dream = db.get_dream(id).unwrap().unwrap();
        assert_eq!(dream.title, "Endless staircase");
        assert_eq!(dream.dream_clarity, Some(4));
        assert_eq!(dream.emotions.after_dream.as_deref(), Some("relief"));
        assert_eq!(dream.elements.places, vec!["tower"]);
        assert_eq!(dream.tags, vec!["Seeker"]);
        assert!(dream.is_recurring);
        assert!(dream.created_at.is_some());
        assert_eq!(dream.dream_day().to_string(), "2024-04-02");

        let updated = db
            .update_dream(
                id,
                DreamPatch {
                    title: Some("Staircase".to_string()),
                    dream_type: Some("nightmare".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Staircase");
        assert_eq!(updated.declared_type(), Some("nightmare"));
        // Untouched fields survive the patch
        assert_eq!(updated.themes, vec!["pursuit"]);

        assert!(db.delete_dream(id).unwrap());
        assert!(!db.delete_dream(id).unwrap());
        assert!(db.get_dream(id).unwrap().is_none());
    }

    #[test]
    fn test_update_missing_dream() {
        let db = Database::in_memory().unwrap();
        let err = db.update_dream(42, DreamPatch::default()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_rating_validation() {
        let db = Database::in_memory().unwrap();

        let mut dream = new_dream("Too clear");
        dream.dream_clarity = Some(6);
        assert!(matches!(db.save_dream(&dream), Err(Error::InvalidData(_))));

        let id = db.save_dream(&new_dream("Fine")).unwrap();
        let patch = DreamPatch {
            sleep_quality: Some(0),
            ..Default::default()
        };
        assert!(matches!(db.update_dream(id, patch), Err(Error::InvalidData(_))));
        assert_eq!(db.count_dreams().unwrap(), 1);
    }

    #[test]
    fn test_record_events() {
        let db = Database::in_memory().unwrap();
        let mut events = db.subscribe();

        let id = db.save_dream(&new_dream("First")).unwrap();
        db.update_dream(id, DreamPatch::default()).unwrap();
        db.delete_dream(id).unwrap();
        db.insert_dreams(&[]).unwrap();

        assert_eq!(events.try_recv().unwrap(), RecordEvent::Saved { id });
        assert_eq!(events.try_recv().unwrap(), RecordEvent::Updated { id });
        assert_eq!(events.try_recv().unwrap(), RecordEvent::Deleted { id });
        assert_eq!(events.try_recv().unwrap(), RecordEvent::Imported { count: 0 });
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_clones_share_events() {
        let db = Database::in_memory().unwrap();
        let mut events = db.subscribe();

        let clone = db.clone();
        let id = clone.save_dream(&new_dream("Shared")).unwrap();
        assert_eq!(events.try_recv().unwrap(), RecordEvent::Saved { id });
    }

    #[test]
    fn test_heterogeneous_dates_round_trip() {
        let db = Database::in_memory().unwrap();

        let iso = DreamBuilder::new().title("iso").date("2024-03-01").build();
        let epoch = DreamBuilder::new()
            .title("epoch")
            .date_input(DateInput::EpochMillis(1_709_272_800_000.0))
            .build();
        let digits = DreamBuilder::new().title("digits").date("1709272800000").build();
        let legacy = DreamBuilder::new().title("legacy").legacy_symbols(&["mirror"]).build();

        assert_eq!(db.insert_dreams(&[iso, epoch, digits, legacy]).unwrap(), 4);

        let dreams = db.list_dreams().unwrap();
        assert_eq!(dreams.len(), 4);
        assert_eq!(dreams[0].dream_date, Some(DateInput::Text("2024-03-01".to_string())));
        assert_eq!(dreams[1].dream_date, Some(DateInput::EpochMillis(1_709_272_800_000.0)));
        assert_eq!(dreams[2].dream_date, Some(DateInput::Text("1709272800000".to_string())));
        assert_eq!(dreams[3].dream_date, None);
        assert_eq!(dreams[3].symbols, vec!["mirror"]);

        // 1709272800000 ms is 2024-03-01T06:00:00Z
        for dream in &dreams[..3] {
            assert_eq!(dream.dream_day().to_string(), "2024-03-01");
        }
    }

    #[test]
    fn test_corrupt_json_column_reads_as_empty() {
        let db = Database::in_memory().unwrap();
        let id = db.save_dream(&new_dream("Broken")).unwrap();

        db.conn()
            .unwrap()
            .execute("UPDATE dreams SET themes = 'not json' WHERE id = ?", [id])
            .unwrap();

        let dream = db.get_dream(id).unwrap().unwrap();
        assert!(dream.themes.is_empty());
    }

    #[test]
    fn test_cache_values() {
        let db = Database::in_memory().unwrap();

        assert!(db.get_cache_value("insights.payload").unwrap().is_none());
        db.set_cache_value("insights.payload", "{}").unwrap();
        db.set_cache_value("insights.payload", "{\"v\":2}").unwrap();
        assert_eq!(
            db.get_cache_value("insights.payload").unwrap().as_deref(),
            Some("{\"v\":2}")
        );

        assert!(db.delete_cache_value("insights.payload").unwrap());
        assert!(!db.delete_cache_value("insights.payload").unwrap());
    }

    #[test]
    fn test_writes_from_another_handle_invalidate_insights() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("journal.db");
        let path = path.to_string_lossy();

        let reader = Database::new_unencrypted(&path).unwrap();
        let writer = Database::new_unencrypted(&path).unwrap();
        let stamp = "2024-05-01T00:00:00+00:00";

        reader.set_cache_value(TIMESTAMP_KEY, stamp).unwrap();
        reader.set_cache_value(PAYLOAD_KEY, "{}").unwrap();
        let id = writer.save_dream(&new_dream("Saved elsewhere")).unwrap();
        assert!(reader.get_cache_value(TIMESTAMP_KEY).unwrap().is_none());
        // The payload stays available as a stale fallback
        assert!(reader.get_cache_value(PAYLOAD_KEY).unwrap().is_some());

        reader.set_cache_value(TIMESTAMP_KEY, stamp).unwrap();
        writer.update_dream(id, DreamPatch::default()).unwrap();
        assert!(reader.get_cache_value(TIMESTAMP_KEY).unwrap().is_none());

        reader.set_cache_value(TIMESTAMP_KEY, stamp).unwrap();
        writer
            .insert_dreams(&[DreamBuilder::new().title("Imported").build()])
            .unwrap();
        assert!(reader.get_cache_value(TIMESTAMP_KEY).unwrap().is_none());

        reader.set_cache_value(TIMESTAMP_KEY, stamp).unwrap();
        writer.delete_dream(id).unwrap();
        assert!(reader.get_cache_value(TIMESTAMP_KEY).unwrap().is_none());
    }

    #[test]
    fn test_failed_write_keeps_insights_fresh() {
        let db = Database::in_memory().unwrap();
        db.set_cache_value(TIMESTAMP_KEY, "2024-05-01T00:00:00+00:00").unwrap();

        let mut dream = new_dream("Too clear");
        dream.dream_clarity = Some(6);
        assert!(db.save_dream(&dream).is_err());
        assert!(!db.delete_dream(42).unwrap());

        assert!(db.get_cache_value(TIMESTAMP_KEY).unwrap().is_some());
    }

    #[test]
    fn test_encrypted_database_requires_key() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("journal.db");
        let path = path.to_string_lossy();

        let db = Database::new_with_key(&path, Some("correct horse")).unwrap();
        db.save_dream(&new_dream("Secret")).unwrap();
        drop(db);

        let reopened = Database::new_with_key(&path, Some("correct horse")).unwrap();
        assert_eq!(reopened.count_dreams().unwrap(), 1);

        assert!(Database::new_with_key(&path, Some("wrong")).is_err());
    }

    #[test]
    fn test_derive_key_is_stable() {
        let a = derive_key("passphrase").unwrap();
        let b = derive_key("passphrase").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, derive_key("other").unwrap());
    }
}

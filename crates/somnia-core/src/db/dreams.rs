//! Dream journal operations

use rusqlite::{params, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use tracing::warn;

use super::insight_cache::invalidate_insights;
use super::{format_datetime, parse_datetime, Database};
use crate::dates;
use crate::error::{Error, Result};
use crate::models::{
    DateInput, DreamElements, DreamPatch, DreamRecord, Emotions, NewDream, RecordEvent,
    RATING_RANGE,
};

const DREAM_COLUMNS: &str = "id, dream_date, title, content, interpretation, sleep_quality, \
    dream_clarity, emotions, elements, legacy_symbols, themes, tags, personal_notes, \
    is_recurring, is_lucid, dream_type, created_at, updated_at";

impl Database {
    /// All journal entries, oldest first by id
    pub fn list_dreams(&self) -> Result<Vec<DreamRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {} FROM dreams ORDER BY id", DREAM_COLUMNS))?;
        let dreams = stmt
            .query_map([], row_to_dream)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(dreams)
    }

    pub fn get_dream(&self, id: i64) -> Result<Option<DreamRecord>> {
        let conn = self.conn()?;
        let dream = conn
            .query_row(
                &format!("SELECT {} FROM dreams WHERE id = ?", DREAM_COLUMNS),
                params![id],
                row_to_dream,
            )
            .optional()?;
        Ok(dream)
    }

    pub fn count_dreams(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM dreams", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Save a new dream and publish [`RecordEvent::Saved`]
    ///
    /// Every write also invalidates the cached insights in the same
    /// transaction.
    pub fn save_dream(&self, dream: &NewDream) -> Result<i64> {
        validate_rating("sleepQuality", dream.sleep_quality)?;
        validate_rating("dreamClarity", dream.dream_clarity)?;

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO dreams (dream_date, title, content, interpretation, sleep_quality,
                dream_clarity, emotions, elements, themes, tags, personal_notes,
                is_recurring, is_lucid, dream_type)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                encode_date(dream.dream_date.as_ref())?,
                dream.title,
                dream.content,
                dream.interpretation,
                dream.sleep_quality,
                dream.dream_clarity,
                serde_json::to_string(&dream.emotions)?,
                serde_json::to_string(&dream.elements)?,
                serde_json::to_string(&dream.themes)?,
                serde_json::to_string(&dream.tags)?,
                dream.personal_notes,
                dream.is_recurring,
                dream.is_lucid,
                dream.dream_type,
            ],
        )?;

        let id = tx.last_insert_rowid();
        invalidate_insights(&tx)?;
        tx.commit()?;

        self.emit(RecordEvent::Saved { id });
        Ok(id)
    }

    /// Apply a partial update and publish [`RecordEvent::Updated`]
    pub fn update_dream(&self, id: i64, patch: DreamPatch) -> Result<DreamRecord> {
        validate_rating("sleepQuality", patch.sleep_quality)?;
        validate_rating("dreamClarity", patch.dream_clarity)?;

        let mut dream = self
            .get_dream(id)?
            .ok_or_else(|| Error::NotFound(format!("dream {}", id)))?;
        patch.apply(&mut dream);

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            r#"
            UPDATE dreams
            SET dream_date = ?, title = ?, content = ?, interpretation = ?, sleep_quality = ?,
                dream_clarity = ?, emotions = ?, elements = ?, themes = ?, tags = ?,
                personal_notes = ?, is_recurring = ?, is_lucid = ?, dream_type = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
            params![
                encode_date(dream.dream_date.as_ref())?,
                dream.title,
                dream.content,
                dream.interpretation,
                dream.sleep_quality,
                dream.dream_clarity,
                serde_json::to_string(&dream.emotions)?,
                serde_json::to_string(&dream.elements)?,
                serde_json::to_string(&dream.themes)?,
                serde_json::to_string(&dream.tags)?,
                dream.personal_notes,
                dream.is_recurring,
                dream.is_lucid,
                dream.dream_type,
                id,
            ],
        )?;
        invalidate_insights(&tx)?;
        tx.commit()?;
        drop(conn);

        self.emit(RecordEvent::Updated { id });
        self.get_dream(id)?
            .ok_or_else(|| Error::NotFound(format!("dream {}", id)))
    }

    /// Delete a dream; returns false if it did not exist
    pub fn delete_dream(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM dreams WHERE id = ?", params![id])?;
        if removed > 0 {
            invalidate_insights(&tx)?;
        }
        tx.commit()?;

        if removed > 0 {
            self.emit(RecordEvent::Deleted { id });
        }
        Ok(removed > 0)
    }

    /// Insert records as-is (used by journal import)
    ///
    /// Dates keep their raw form. Ids are reassigned. Runs in one transaction
    /// and publishes a single [`RecordEvent::Imported`].
    pub fn insert_dreams(&self, dreams: &[DreamRecord]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        for dream in dreams {
            let created_at = dream
                .created_at
                .as_ref()
                .map(|raw| format_datetime(&dates::resolve(Some(raw))));
            let updated_at = dream
                .updated_at
                .as_ref()
                .map(|raw| format_datetime(&dates::resolve(Some(raw))));

            tx.execute(
                r#"
                INSERT INTO dreams (dream_date, title, content, interpretation, sleep_quality,
                    dream_clarity, emotions, elements, legacy_symbols, themes, tags,
                    personal_notes, is_recurring, is_lucid, dream_type, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                    COALESCE(?, CURRENT_TIMESTAMP), COALESCE(?, CURRENT_TIMESTAMP))
                "#,
                params![
                    encode_date(dream.dream_date.as_ref())?,
                    dream.title,
                    dream.content,
                    dream.interpretation,
                    dream.sleep_quality,
                    dream.dream_clarity,
                    serde_json::to_string(&dream.emotions)?,
                    serde_json::to_string(&dream.elements)?,
                    serde_json::to_string(&dream.symbols)?,
                    serde_json::to_string(&dream.themes)?,
                    serde_json::to_string(&dream.tags)?,
                    dream.personal_notes,
                    dream.is_recurring,
                    dream.is_lucid,
                    dream.dream_type,
                    created_at,
                    updated_at,
                ],
            )?;
        }

        invalidate_insights(&tx)?;
        tx.commit()?;
        self.emit(RecordEvent::Imported {
            count: dreams.len(),
        });
        Ok(dreams.len())
    }
}

fn validate_rating(field: &str, value: Option<u8>) -> Result<()> {
    match value {
        Some(v) if !RATING_RANGE.contains(&v) => Err(Error::InvalidData(format!(
            "{} must be between {} and {}, got {}",
            field,
            RATING_RANGE.start(),
            RATING_RANGE.end(),
            v
        ))),
        _ => Ok(()),
    }
}

fn encode_date(date: Option<&DateInput>) -> Result<Option<String>> {
    Ok(date.map(serde_json::to_string).transpose()?)
}

fn decode_date(raw: Option<String>) -> Option<DateInput> {
    raw.map(|text| serde_json::from_str(&text).unwrap_or(DateInput::Text(text)))
}

/// Decode a JSON column, falling back to the empty value on corrupt data
fn decode_json<T: DeserializeOwned + Default>(raw: &str, column: &str, id: i64) -> T {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(id, column, error = %e, "Corrupt JSON column, using empty value");
        T::default()
    })
}

fn row_to_dream(row: &Row) -> rusqlite::Result<DreamRecord> {
    let id: i64 = row.get(0)?;
    let emotions: String = row.get(7)?;
    let elements: String = row.get(8)?;
    let legacy_symbols: String = row.get(9)?;
    let themes: String = row.get(10)?;
    let tags: String = row.get(11)?;
    let created_at: Option<String> = row.get(16)?;
    let updated_at: Option<String> = row.get(17)?;

    Ok(DreamRecord {
        id,
        dream_date: decode_date(row.get(1)?),
        title: row.get(2)?,
        content: row.get(3)?,
        interpretation: row.get(4)?,
        sleep_quality: row.get(5)?,
        dream_clarity: row.get(6)?,
        emotions: decode_json::<Emotions>(&emotions, "emotions", id),
        elements: decode_json::<DreamElements>(&elements, "elements", id),
        symbols: decode_json(&legacy_symbols, "legacy_symbols", id),
        themes: decode_json(&themes, "themes", id),
        tags: decode_json(&tags, "tags", id),
        personal_notes: row.get(12)?,
        is_recurring: row.get(13)?,
        is_lucid: row.get(14)?,
        dream_type: row.get(15)?,
        created_at: created_at.map(|s| DateInput::Instant(parse_datetime(&s))),
        updated_at: updated_at.map(|s| DateInput::Instant(parse_datetime(&s))),
    })
}

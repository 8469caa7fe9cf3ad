//! Insight cache operations

use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::broadcast;

use super::Database;
use crate::error::Result;
use crate::insights::{JournalStore, TIMESTAMP_KEY};
use crate::models::{DreamRecord, RecordEvent};

impl Database {
    pub fn get_cache_value(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM insight_cache WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_cache_value(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO insight_cache (key, value, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key; returns false if it was not present
    pub fn delete_cache_value(&self, key: &str) -> Result<bool> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM insight_cache WHERE key = ?", params![key])?;
        Ok(removed > 0)
    }
}

/// Drop the insight timestamp so every reader, in any process, sees the
/// cached payload as stale
///
/// Called inside the transaction of each record write.
pub(super) fn invalidate_insights(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM insight_cache WHERE key = ?", params![TIMESTAMP_KEY])?;
    Ok(())
}

impl JournalStore for Database {
    fn list_dreams(&self) -> Result<Vec<DreamRecord>> {
        Database::list_dreams(self)
    }

    fn cache_get(&self, key: &str) -> Result<Option<String>> {
        self.get_cache_value(key)
    }

    fn cache_put(&self, key: &str, value: &str) -> Result<()> {
        self.set_cache_value(key, value)
    }

    fn cache_delete(&self, key: &str) -> Result<()> {
        self.delete_cache_value(key).map(|_| ())
    }

    fn subscribe(&self) -> broadcast::Receiver<RecordEvent> {
        Database::subscribe(self)
    }
}

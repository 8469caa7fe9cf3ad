//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `dreams` - Dream journal CRUD and the record event channel
//! - `insight_cache` - Keyed blobs backing the insight payload cache

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tokio::sync::broadcast;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::RecordEvent;

mod dreams;
mod insight_cache;

#[cfg(test)]
mod tests;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "SOMNIA_DB_KEY";

/// Buffered record events per subscriber before older ones are dropped
const EVENT_CAPACITY: usize = 64;

/// Derive an encryption key from a passphrase using Argon2id
///
/// A fixed application salt means the same passphrase always yields the same
/// key, so the database file can be moved or restored freely.
fn derive_key(passphrase: &str) -> Result<String> {
    use argon2::{password_hash::SaltString, Argon2, PasswordHasher};

    // Changing this invalidates every existing encrypted journal
    const APP_SALT: &[u8; 16] = b"somnia-journal-1";

    let salt = SaltString::encode_b64(APP_SALT)
        .map_err(|e| Error::Encryption(format!("Failed to create salt: {}", e)))?;

    let hash = Argon2::default()
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Encryption(format!("Failed to derive key: {}", e)))?;

    let output = hash
        .hash
        .ok_or_else(|| Error::Encryption("No hash output".to_string()))?;
    Ok(hex::encode(output.as_bytes()))
}

/// Parse a SQLite `DATETIME` column (`YYYY-MM-DD HH:MM:SS`, UTC)
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Format an instant for a SQLite `DATETIME` column
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Journal database with connection pooling
///
/// Clones share the pool and the record event channel.
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    db_path: String,
    events: broadcast::Sender<RecordEvent>,
}

impl Database {
    /// Open (or create) an encrypted journal
    ///
    /// Requires `SOMNIA_DB_KEY`. Use [`Database::new_unencrypted`] for
    /// development and tests.
    pub fn new(path: &str) -> Result<Self> {
        match std::env::var(DB_KEY_ENV).ok() {
            Some(key) => Self::new_with_key(path, Some(&key)),
            None => Err(Error::Encryption(format!(
                "Database encryption required. Set {} with your passphrase, \
                or use --no-encrypt for an unencrypted journal.",
                DB_KEY_ENV
            ))),
        }
    }

    /// Open (or create) an unencrypted journal
    pub fn new_unencrypted(path: &str) -> Result<Self> {
        Self::new_with_key(path, None)
    }

    /// Open (or create) a journal with an explicit passphrase
    pub fn new_with_key(path: &str, passphrase: Option<&str>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);

        let pool = match passphrase {
            Some(pass) => {
                let key_pragma = format!("PRAGMA key = 'x\"{}\"';", derive_key(pass)?);
                let manager = manager.with_init(move |conn| conn.execute_batch(&key_pragma));
                Pool::builder().max_size(8).build(manager)?
            }
            None => Pool::builder().max_size(8).build(manager)?,
        };

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let db = Self {
            pool,
            db_path: path.to_string(),
            events,
        };
        db.run_migrations()?;
        debug!(path, encrypted = passphrase.is_some(), "Opened journal database");

        Ok(db)
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` because each pooled
    /// connection would otherwise see its own empty database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!(
            "somnia_test_{}_{}.db",
            std::process::id(),
            id
        ));
        let _ = std::fs::remove_file(&path);

        Self::new_unencrypted(&path.to_string_lossy())
    }

    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Subscribe to record events (saved, updated, deleted, imported)
    pub fn subscribe(&self) -> broadcast::Receiver<RecordEvent> {
        self.events.subscribe()
    }

    /// Publish a record event; having no subscribers is not an error
    pub(crate) fn emit(&self, event: RecordEvent) {
        let receivers = self.events.send(event).unwrap_or(0);
        debug!(?event, receivers, "Record event");
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;

            -- Journal entries. List-valued fields are JSON text; dream_date is
            -- the JSON of the raw date as entered or imported.
            CREATE TABLE IF NOT EXISTS dreams (
                id INTEGER PRIMARY KEY,
                dream_date TEXT,
                title TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL DEFAULT '',
                interpretation TEXT,
                sleep_quality INTEGER,
                dream_clarity INTEGER,
                emotions TEXT NOT NULL DEFAULT '{}',
                elements TEXT NOT NULL DEFAULT '{}',
                legacy_symbols TEXT NOT NULL DEFAULT '[]',
                themes TEXT NOT NULL DEFAULT '[]',
                tags TEXT NOT NULL DEFAULT '[]',
                personal_notes TEXT,
                is_recurring BOOLEAN NOT NULL DEFAULT 0,
                is_lucid BOOLEAN NOT NULL DEFAULT 0,
                dream_type TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_dreams_created ON dreams(created_at);

            -- Insight payload and TTL timestamp
            CREATE TABLE IF NOT EXISTS insight_cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;

        debug!("Database migrations complete");
        Ok(())
    }
}

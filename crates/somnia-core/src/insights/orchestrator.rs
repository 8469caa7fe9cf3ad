//! Insight orchestrator
//!
//! Owns the cached insight payload and decides when to regenerate it.
//!
//! ```text
//!   get_insights()
//!        │
//!        ├─ Fresh ──────────────► cached payload
//!        │
//!        └─ Stale / Absent ─► regen lock ─► re-check ─► regenerate
//!                                                        │
//!            records < 2 ──────────────► placeholder     │
//!            generator ok ─────────────► generated + backfill
//!            failure / timeout / none ─► placeholder (degraded)
//!                                                        │
//!                                        persist payload + timestamp
//! ```
//!
//! Record writes make the cache stale in two ways. The store drops the
//! timestamp key in the write's own transaction, which every process sees.
//! In-process, the store's record events also set a stale flag. Regeneration
//! happens lazily on the next read.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use super::digest::NarrativeRequest;
use super::placeholder::placeholder_payload;
use super::types::{CachedInsight, InsightPayload, InsightSource, InsightState};
use crate::ai::{AIClient, NarrativeBackend};
use crate::analytics::summarize;
use crate::config::SomniaConfig;
use crate::error::{Error, Result};
use crate::models::{DreamRecord, RecordEvent};
use crate::outcome::Outcome;

/// Cache key holding the serialized [`CachedInsight`]
pub const PAYLOAD_KEY: &str = "insights.payload";

/// Cache key holding the RFC 3339 generation timestamp used for the TTL
pub const TIMESTAMP_KEY: &str = "insights.generated_at";

/// Storage the orchestrator reads records from and keeps its cache in
pub trait JournalStore: Send + Sync {
    fn list_dreams(&self) -> Result<Vec<DreamRecord>>;

    fn cache_get(&self, key: &str) -> Result<Option<String>>;

    fn cache_put(&self, key: &str, value: &str) -> Result<()>;

    fn cache_delete(&self, key: &str) -> Result<()>;

    /// Receiver for record write notifications
    fn subscribe(&self) -> broadcast::Receiver<RecordEvent>;
}

impl<T: JournalStore> JournalStore for Arc<T> {
    fn list_dreams(&self) -> Result<Vec<DreamRecord>> {
        (**self).list_dreams()
    }

    fn cache_get(&self, key: &str) -> Result<Option<String>> {
        (**self).cache_get(key)
    }

    fn cache_put(&self, key: &str, value: &str) -> Result<()> {
        (**self).cache_put(key, value)
    }

    fn cache_delete(&self, key: &str) -> Result<()> {
        (**self).cache_delete(key)
    }

    fn subscribe(&self) -> broadcast::Receiver<RecordEvent> {
        (**self).subscribe()
    }
}

/// Produces insight payloads, caching them behind a TTL
pub struct InsightOrchestrator<S> {
    store: S,
    generator: Option<AIClient>,
    config: SomniaConfig,
    events: std::sync::Mutex<broadcast::Receiver<RecordEvent>>,
    force_stale: AtomicBool,
    regen_lock: tokio::sync::Mutex<()>,
}

impl<S: JournalStore> InsightOrchestrator<S> {
    pub fn new(store: S, generator: Option<AIClient>, config: SomniaConfig) -> Self {
        let events = store.subscribe();
        Self {
            store,
            generator,
            config,
            events: std::sync::Mutex::new(events),
            force_stale: AtomicBool::new(false),
            regen_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn generator(&self) -> Option<&AIClient> {
        self.generator.as_ref()
    }

    pub fn config(&self) -> &SomniaConfig {
        &self.config
    }

    /// Current cache state
    pub fn state(&self) -> InsightState {
        self.drain_events();
        match self.load_cached() {
            Ok(Some(_)) => self.classify(Utc::now()),
            Ok(None) => InsightState::Absent,
            Err(e) => {
                warn!(error = %e, "Failed to read insight cache");
                InsightState::Absent
            }
        }
    }

    /// Current insights, regenerating if the cache is not fresh
    pub async fn get_insights(&self) -> Outcome<InsightPayload> {
        if let Some(outcome) = self.fresh_payload() {
            return outcome;
        }

        let _guard = self.regen_lock.lock().await;

        // Another reader may have regenerated while we waited
        if let Some(outcome) = self.fresh_payload() {
            debug!("Insight cache refreshed by a concurrent reader");
            return outcome;
        }

        self.regenerate().await
    }

    /// Force the next read to regenerate
    pub fn mark_stale(&self) {
        self.force_stale.store(true, Ordering::SeqCst);
        if let Err(e) = self.store.cache_delete(TIMESTAMP_KEY) {
            warn!(error = %e, "Failed to clear insight timestamp");
        }
        debug!("Insight cache marked stale");
    }

    /// Mark stale, then read
    pub async fn refresh(&self) -> Outcome<InsightPayload> {
        self.mark_stale();
        self.get_insights().await
    }

    /// Remove the cached payload and its timestamp
    pub fn clear_cache(&self) -> Result<()> {
        self.store.cache_delete(PAYLOAD_KEY)?;
        self.store.cache_delete(TIMESTAMP_KEY)?;
        info!("Insight cache cleared");
        Ok(())
    }

    /// Translate store write notifications into [`mark_stale`](Self::mark_stale)
    ///
    /// Runs until the store's event channel closes.
    pub async fn watch_record_events(&self) {
        let mut events = self.store.subscribe();
        loop {
            match events.recv().await {
                Ok(event) => {
                    debug!(?event, "Record event");
                    self.mark_stale();
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    debug!(missed, "Record events lagged");
                    self.mark_stale();
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    fn fresh_payload(&self) -> Option<Outcome<InsightPayload>> {
        if self.state() != InsightState::Fresh {
            return None;
        }
        let cached = self.load_cached().ok().flatten()?;
        Some(match cached.payload.source {
            InsightSource::Generated => Outcome::nominal(cached.payload),
            InsightSource::Placeholder => Outcome::placeholder(cached.payload),
        })
    }

    fn drain_events(&self) {
        let mut events = self.events.lock().unwrap_or_else(|p| p.into_inner());
        loop {
            match events.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => {
                    self.force_stale.store(true, Ordering::SeqCst);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    fn classify(&self, now: DateTime<Utc>) -> InsightState {
        if self.force_stale.load(Ordering::SeqCst) {
            return InsightState::Stale;
        }

        let stamp = match self.store.cache_get(TIMESTAMP_KEY) {
            Ok(Some(raw)) => DateTime::parse_from_rfc3339(&raw).ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read insight timestamp");
                None
            }
        };

        match stamp {
            Some(ts) if now.signed_duration_since(ts.with_timezone(&Utc)) < self.config.insights.ttl() => {
                InsightState::Fresh
            }
            _ => InsightState::Stale,
        }
    }

    fn load_cached(&self) -> Result<Option<CachedInsight>> {
        let Some(raw) = self.store.cache_get(PAYLOAD_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(cached) => Ok(Some(cached)),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable insight cache entry");
                Ok(None)
            }
        }
    }

    async fn regenerate(&self) -> Outcome<InsightPayload> {
        self.force_stale.store(false, Ordering::SeqCst);

        let records = match self.store.list_dreams() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Failed to list dreams, serving fallback insights");
                let fallback = match self.load_cached() {
                    Ok(Some(cached)) => cached.payload,
                    _ => placeholder_payload(0, &summarize(&[]), Utc::now()),
                };
                return Outcome::degraded(fallback, e.to_string());
            }
        };

        let now = Utc::now();
        let count = records.len();
        let summary = summarize(&records);
        let defaults = placeholder_payload(count, &summary, now);

        let outcome = if count < 2 {
            debug!(count, "Too few dreams for narrative generation");
            Outcome::placeholder(defaults)
        } else {
            match &self.generator {
                None => Outcome::degraded(defaults, "no narrative generator configured"),
                Some(client) => self.generate(client, &records, defaults).await,
            }
        };

        self.persist(outcome.value(), now);
        info!(
            dreams = count,
            status = outcome.status(),
            source = %outcome.value().source,
            "Regenerated insights"
        );
        outcome
    }

    async fn generate(
        &self,
        client: &AIClient,
        records: &[DreamRecord],
        defaults: InsightPayload,
    ) -> Outcome<InsightPayload> {
        let request = NarrativeRequest::build(records, &self.config);
        let timeout = self.config.insights.generator_timeout();

        match tokio::time::timeout(timeout, client.generate_insights(&request)).await {
            Ok(Ok(generated)) => Outcome::nominal(generated.backfill(defaults)),
            Ok(Err(e)) => {
                warn!(error = %e, model = %client.model(), "Narrative generation failed");
                Outcome::degraded(defaults, e.to_string())
            }
            Err(_) => {
                let e = Error::Timeout(timeout.as_secs());
                warn!(error = %e, model = %client.model(), "Narrative generation timed out");
                Outcome::degraded(defaults, e.to_string())
            }
        }
    }

    fn persist(&self, payload: &InsightPayload, generated_at: DateTime<Utc>) {
        let cached = CachedInsight {
            payload: payload.clone(),
            generated_at,
        };
        let result = serde_json::to_string(&cached)
            .map_err(Error::from)
            .and_then(|json| self.store.cache_put(PAYLOAD_KEY, &json))
            .and_then(|()| self.store.cache_put(TIMESTAMP_KEY, &generated_at.to_rfc3339()));

        if let Err(e) = result {
            warn!(error = %e, "Failed to persist insights");
        }
    }
}

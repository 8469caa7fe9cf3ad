//! Data models for Somnia
//!
//! Journal records are owned by the record store and treated as read-only
//! input by the analytics engines. Everything else in this module is derived
//! per query and never persisted, except [`crate::insights::InsightPayload`].

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::dates;

/// Dream type assigned to records that do not declare one
pub const DEFAULT_DREAM_TYPE: &str = "normal";

/// Placeholder shown for summary fields that have no data
pub const NO_DATA: &str = "-";

/// Lowest and highest accepted rating for sleep quality and clarity
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// A date as it was stored or imported
///
/// Older journals carry dates as ISO strings, epoch milliseconds (numbers or
/// all-digit strings), or proper timestamps. The raw form is kept so the
/// date normalizer can resolve it at read time. Any other JSON value is kept
/// as [`DateInput::Other`] so the record still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    /// An already-valid instant
    Instant(DateTime<Utc>),
    /// Milliseconds since the Unix epoch
    EpochMillis(f64),
    /// Anything else that arrived as text
    Text(String),
    /// A value that is not a date at all (object, boolean, array)
    Other(serde_json::Value),
}

impl From<DateTime<Utc>> for DateInput {
    fn from(value: DateTime<Utc>) -> Self {
        DateInput::Instant(value)
    }
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        DateInput::Text(value.to_string())
    }
}

impl From<NaiveDate> for DateInput {
    fn from(value: NaiveDate) -> Self {
        DateInput::Text(value.format("%Y-%m-%d").to_string())
    }
}

/// Emotions felt during and after a dream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Emotions {
    /// Set of emotions felt inside the dream (insertion order kept)
    #[serde(default)]
    pub during_dream: Vec<String>,
    /// The dominant emotion on waking
    #[serde(default)]
    pub after_dream: Option<String>,
}

/// People, places and symbols that appeared in a dream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DreamElements {
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub places: Vec<String>,
    #[serde(default)]
    pub symbols: Vec<String>,
}

/// A journaled dream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub dream_date: Option<DateInput>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub interpretation: Option<String>,
    #[serde(default, deserialize_with = "deserialize_rating")]
    pub sleep_quality: Option<u8>,
    #[serde(default, deserialize_with = "deserialize_rating")]
    pub dream_clarity: Option<u8>,
    #[serde(default)]
    pub emotions: Emotions,
    #[serde(default)]
    pub elements: DreamElements,
    /// Flat symbol list written by older versions; merged with `elements.symbols`
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    /// Archetype tags
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub personal_notes: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub is_lucid: bool,
    /// Declared dream type (e.g. "lucid", "nightmare"); untyped means "normal"
    #[serde(default)]
    pub dream_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateInput>,
    #[serde(default)]
    pub updated_at: Option<DateInput>,
}

impl DreamRecord {
    /// Normalized dream date; degrades to "now" when the stored value is unusable
    pub fn dream_instant(&self) -> DateTime<Utc> {
        dates::resolve(self.dream_date.as_ref())
    }

    /// Calendar day (UTC) of the normalized dream date
    pub fn dream_day(&self) -> NaiveDate {
        self.dream_instant().date_naive()
    }

    /// Declared type, if any (blank counts as undeclared)
    pub fn declared_type(&self) -> Option<&str> {
        self.dream_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Declared type with the default applied
    pub fn type_or_default(&self) -> &str {
        self.declared_type().unwrap_or(DEFAULT_DREAM_TYPE)
    }
}

/// A dream to be saved in the journal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDream {
    pub dream_date: Option<DateInput>,
    pub title: String,
    pub content: String,
    pub interpretation: Option<String>,
    pub sleep_quality: Option<u8>,
    pub dream_clarity: Option<u8>,
    pub emotions: Emotions,
    pub elements: DreamElements,
    pub themes: Vec<String>,
    pub tags: Vec<String>,
    pub personal_notes: Option<String>,
    pub is_recurring: bool,
    pub is_lucid: bool,
    pub dream_type: Option<String>,
}

/// Partial update for an existing dream; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamPatch {
    pub dream_date: Option<DateInput>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub interpretation: Option<String>,
    pub sleep_quality: Option<u8>,
    pub dream_clarity: Option<u8>,
    pub emotions: Option<Emotions>,
    pub elements: Option<DreamElements>,
    pub themes: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub personal_notes: Option<String>,
    pub is_recurring: Option<bool>,
    pub is_lucid: Option<bool>,
    pub dream_type: Option<String>,
}

impl DreamPatch {
    /// Apply this patch to a record in place
    pub fn apply(self, record: &mut DreamRecord) {
        if let Some(v) = self.dream_date {
            record.dream_date = Some(v);
        }
        if let Some(v) = self.title {
            record.title = v;
        }
        if let Some(v) = self.content {
            record.content = v;
        }
        if let Some(v) = self.interpretation {
            record.interpretation = Some(v);
        }
        if let Some(v) = self.sleep_quality {
            record.sleep_quality = Some(v);
        }
        if let Some(v) = self.dream_clarity {
            record.dream_clarity = Some(v);
        }
        if let Some(v) = self.emotions {
            record.emotions = v;
        }
        if let Some(v) = self.elements {
            record.elements = v;
        }
        if let Some(v) = self.themes {
            record.themes = v;
        }
        if let Some(v) = self.tags {
            record.tags = v;
        }
        if let Some(v) = self.personal_notes {
            record.personal_notes = Some(v);
        }
        if let Some(v) = self.is_recurring {
            record.is_recurring = v;
        }
        if let Some(v) = self.is_lucid {
            record.is_lucid = v;
        }
        if let Some(v) = self.dream_type {
            record.dream_type = Some(v);
        }
    }
}

/// Events published by the record store after a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordEvent {
    Saved { id: i64 },
    Updated { id: i64 },
    Deleted { id: i64 },
    Imported { count: usize },
}

// ========== Derived analytics types ==========

/// One category value and how often it occurs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyDatum {
    pub name: String,
    pub count: usize,
    /// Hex color token for charts (`#rrggbb`)
    pub color: String,
}

/// Per-day averages of the two rating fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityPoint {
    pub day: NaiveDate,
    pub mean_clarity: Option<f64>,
    pub mean_sleep_quality: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothed_clarity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothed_sleep_quality: Option<f64>,
}

/// Records grouped under one week or month key
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodBucket<'a> {
    pub period_key: String,
    pub records: Vec<&'a DreamRecord>,
}

/// Count for one period: per declared type, or the period total when untyped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodDatum {
    pub period: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dream_type: Option<String>,
    pub count: usize,
}

impl PeriodDatum {
    /// True for the datum holding the bucket's total count
    pub fn is_total(&self) -> bool {
        self.dream_type.is_none()
    }
}

/// Histogram entry for one weekday
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayCount {
    pub weekday: String,
    pub count: usize,
}

/// Histogram entry for one time-of-day slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlotCount {
    pub slot: String,
    pub count: usize,
}

/// Weekday and time-of-day histograms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternReport {
    pub weekdays: Vec<WeekdayCount>,
    pub time_of_day: Vec<TimeSlotCount>,
    /// Records whose hour fell outside every slot
    pub unclassified: usize,
}

/// Top-level journal KPIs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_dreams: usize,
    pub avg_quality: f64,
    pub top_emotion: String,
    pub top_theme: String,
    pub last_dream_date: String,
    pub recorded_days: usize,
    pub dream_types: BTreeMap<String, usize>,
}

impl AnalyticsSummary {
    /// The fixed "no data" structure returned for an empty journal
    pub fn empty() -> Self {
        Self {
            total_dreams: 0,
            avg_quality: 0.0,
            top_emotion: NO_DATA.to_string(),
            top_theme: NO_DATA.to_string(),
            last_dream_date: NO_DATA.to_string(),
            recorded_days: 0,
            dream_types: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_dreams == 0
    }
}

/// Accept ratings as numbers or numeric strings; anything outside 1..=5 is dropped
fn deserialize_rating<'de, D>(deserializer: D) -> std::result::Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| parse_rating(&value)))
}

/// Coerce a loosely typed rating into the accepted range
pub fn parse_rating(value: &serde_json::Value) -> Option<u8> {
    let number = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match number {
        Some(n) if n.is_finite() => {
            let rounded = n.round();
            if rounded >= f64::from(*RATING_RANGE.start())
                && rounded <= f64::from(*RATING_RANGE.end())
            {
                Some(rounded as u8)
            } else {
                tracing::warn!(value = %value, "Rating out of range, ignoring");
                None
            }
        }
        _ => {
            if !value.is_null() {
                tracing::warn!(value = %value, "Unparsable rating, ignoring");
            }
            None
        }
    }
}

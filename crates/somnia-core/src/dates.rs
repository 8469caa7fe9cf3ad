//! Date normalization
//!
//! Every bucketing operation needs a usable instant. Stored dates come in
//! several shapes, so they are resolved in a fixed order:
//!
//! 1. an already-valid instant
//! 2. an ISO-8601 string (RFC 3339, naive date-time, or plain date; naive forms are UTC)
//! 3. an all-digit string, read as epoch milliseconds
//! 4. a number, read as epoch milliseconds
//!
//! If nothing resolves, including values that are not dates at all (objects,
//! booleans), the current instant is used and the event is logged.
//! Normalization never fails.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::models::DateInput;
use crate::outcome::Outcome;

/// Naive date-time layouts accepted after RFC 3339 fails
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Normalize a raw date, reporting whether the fallback was used
pub fn normalize(input: &DateInput) -> Outcome<DateTime<Utc>> {
    let resolved = match input {
        DateInput::Instant(instant) => Some(*instant),
        DateInput::Text(text) => parse_text(text),
        DateInput::EpochMillis(ms) => from_epoch_millis(*ms),
        DateInput::Other(_) => None,
    };

    match resolved {
        Some(instant) => Outcome::nominal(instant),
        None => {
            let cause = format!("unparsable date {:?}", input);
            tracing::warn!(input = ?input, "Unparsable date, using current time");
            Outcome::degraded(Utc::now(), cause)
        }
    }
}

/// Normalize an optional raw date; a missing date degrades like a bad one
pub fn normalize_opt(input: Option<&DateInput>) -> Outcome<DateTime<Utc>> {
    match input {
        Some(input) => normalize(input),
        None => {
            tracing::warn!("Missing date, using current time");
            Outcome::degraded(Utc::now(), "missing date")
        }
    }
}

/// Normalize free text (e.g. a CLI argument)
pub fn normalize_str(text: &str) -> Outcome<DateTime<Utc>> {
    normalize(&DateInput::Text(text.to_string()))
}

/// Normalize and keep only the instant
pub fn resolve(input: Option<&DateInput>) -> DateTime<Utc> {
    normalize_opt(input).into_value()
}

fn parse_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    parse_iso(text).or_else(|| {
        if text.bytes().all(|b| b.is_ascii_digit()) {
            text.parse::<i64>()
                .ok()
                .and_then(DateTime::from_timestamp_millis)
        } else {
            None
        }
    })
}

fn parse_iso(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn from_epoch_millis(ms: f64) -> Option<DateTime<Utc>> {
    if !ms.is_finite() || ms.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(ms.trunc() as i64)
}

//! Daily quality trend and frequency-by-period aggregation

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{DreamRecord, PeriodBucket, PeriodDatum, QualityPoint};

/// Default trailing window for smoothing
pub const DEFAULT_WINDOW: usize = 7;

/// Trailing simple moving average
///
/// Output has the same length as the input. Until the window fills
/// (`i < window - 1`) the raw value passes through unchanged; after that each
/// output is the mean of the `window` values ending at `i`.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return values.to_vec();
    }

    values
        .iter()
        .enumerate()
        .map(|(i, &raw)| {
            if i + 1 < window {
                raw
            } else {
                let slice = &values[i + 1 - window..=i];
                slice.iter().sum::<f64>() / window as f64
            }
        })
        .collect()
}

/// Moving average over a series with gaps
///
/// Same pass-through rule as [`moving_average`]; a full window averages only
/// the values that are present and yields `None` if none are.
fn moving_average_sparse(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window <= 1 {
        return values.to_vec();
    }

    values
        .iter()
        .enumerate()
        .map(|(i, &raw)| {
            if i + 1 < window {
                return raw;
            }
            let present: Vec<f64> = values[i + 1 - window..=i].iter().flatten().copied().collect();
            if present.is_empty() {
                None
            } else {
                Some(present.iter().sum::<f64>() / present.len() as f64)
            }
        })
        .collect()
}

/// Group records by normalized calendar day (ascending)
pub fn group_by_day(records: &[DreamRecord]) -> BTreeMap<NaiveDate, Vec<&DreamRecord>> {
    let mut days: BTreeMap<NaiveDate, Vec<&DreamRecord>> = BTreeMap::new();
    for record in records {
        days.entry(record.dream_day()).or_default().push(record);
    }
    days
}

/// Daily mean clarity and sleep quality, smoothed with the default window
pub fn quality_trend(records: &[DreamRecord]) -> Vec<QualityPoint> {
    quality_trend_with_window(records, DEFAULT_WINDOW)
}

/// Daily mean clarity and sleep quality
///
/// Means only count records that declare the field. Smoothed values are set
/// only when the series has at least `window` points.
pub fn quality_trend_with_window(records: &[DreamRecord], window: usize) -> Vec<QualityPoint> {
    let mut points: Vec<QualityPoint> = group_by_day(records)
        .into_iter()
        .map(|(day, day_records)| QualityPoint {
            day,
            mean_clarity: mean(day_records.iter().filter_map(|r| r.dream_clarity)),
            mean_sleep_quality: mean(day_records.iter().filter_map(|r| r.sleep_quality)),
            smoothed_clarity: None,
            smoothed_sleep_quality: None,
        })
        .collect();

    if window > 0 && points.len() >= window {
        let clarity: Vec<Option<f64>> = points.iter().map(|p| p.mean_clarity).collect();
        let sleep: Vec<Option<f64>> = points.iter().map(|p| p.mean_sleep_quality).collect();
        let smoothed_clarity = moving_average_sparse(&clarity, window);
        let smoothed_sleep = moving_average_sparse(&sleep, window);

        for (i, point) in points.iter_mut().enumerate() {
            point.smoothed_clarity = smoothed_clarity[i];
            point.smoothed_sleep_quality = smoothed_sleep[i];
        }
    }

    points
}

fn mean(values: impl Iterator<Item = u8>) -> Option<f64> {
    let (sum, count) = values.fold((0u32, 0u32), |(s, c), v| (s + u32::from(v), c + 1));
    if count == 0 {
        None
    } else {
        Some(f64::from(sum) / f64::from(count))
    }
}

/// Granularity for frequency-by-period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// `YYYY-Www`, Monday-first
    Week,
    /// `YYYY-MM`
    Month,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
        }
    }

    /// Bucket key for a calendar day
    pub fn key(&self, day: NaiveDate) -> String {
        match self {
            Period::Week => week_key(day),
            Period::Month => month_key(day),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "week" | "weekly" => Ok(Period::Week),
            "month" | "monthly" => Ok(Period::Month),
            _ => Err(format!("Unknown period: {}", s)),
        }
    }
}

/// Week key within the calendar year
///
/// Weeks start on Monday. The week number is
/// `ceil((day_of_year + offset) / 7)` where `offset` is how many days Jan 1
/// falls after Monday, so the days before the first Monday share week 1.
pub fn week_key(day: NaiveDate) -> String {
    let offset = NaiveDate::from_ymd_opt(day.year(), 1, 1)
        .map(|jan1| jan1.weekday().num_days_from_monday())
        .unwrap_or(0);
    let week = (day.ordinal() + offset).div_ceil(7);
    format!("{}-W{:02}", day.year(), week)
}

/// Month key (`YYYY-MM`)
pub fn month_key(day: NaiveDate) -> String {
    format!("{}-{:02}", day.year(), day.month())
}

/// Group records into period buckets (ascending by key)
///
/// Records are first grouped by day, then each day bucket is re-keyed to
/// its week or month.
pub fn bucket_by_period(records: &[DreamRecord], period: Period) -> Vec<PeriodBucket<'_>> {
    let mut buckets: BTreeMap<String, Vec<&DreamRecord>> = BTreeMap::new();
    for (day, day_records) in group_by_day(records) {
        buckets
            .entry(period.key(day))
            .or_default()
            .extend(day_records);
    }

    buckets
        .into_iter()
        .map(|(period_key, records)| PeriodBucket {
            period_key,
            records,
        })
        .collect()
}

/// Per-period counts
///
/// Each bucket emits one datum per declared dream type present (first-seen
/// order) followed by exactly one untyped datum holding the bucket total.
/// Undeclared records only count toward the total.
pub fn frequency_by_period(records: &[DreamRecord], period: Period) -> Vec<PeriodDatum> {
    let mut data = Vec::new();

    for bucket in bucket_by_period(records, period) {
        let mut by_type: Vec<(&str, usize)> = Vec::new();
        for record in &bucket.records {
            if let Some(dream_type) = record.declared_type() {
                match by_type.iter_mut().find(|(t, _)| *t == dream_type) {
                    Some(entry) => entry.1 += 1,
                    None => by_type.push((dream_type, 1)),
                }
            }
        }

        for (dream_type, count) in by_type {
            data.push(PeriodDatum {
                period: bucket.period_key.clone(),
                dream_type: Some(dream_type.to_string()),
                count,
            });
        }
        data.push(PeriodDatum {
            period: bucket.period_key.clone(),
            dream_type: None,
            count: bucket.records.len(),
        });
    }

    data
}

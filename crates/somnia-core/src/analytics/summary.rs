//! Top-level journal KPIs

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{AnalyticsSummary, DreamRecord, NO_DATA};

use super::distribution::{top_value, Dimension};

/// Summarize a record collection
///
/// Empty input yields [`AnalyticsSummary::empty`], never a partial structure.
pub fn summarize(records: &[DreamRecord]) -> AnalyticsSummary {
    if records.is_empty() {
        return AnalyticsSummary::empty();
    }

    let clarity: Vec<f64> = records
        .iter()
        .filter_map(|r| r.dream_clarity)
        .map(f64::from)
        .collect();
    let avg_quality = if clarity.is_empty() {
        0.0
    } else {
        clarity.iter().sum::<f64>() / clarity.len() as f64
    };

    let instants: Vec<_> = records.iter().map(DreamRecord::dream_instant).collect();
    let last_dream_date = instants
        .iter()
        .max()
        .map(|latest| latest.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| NO_DATA.to_string());
    let recorded_days = instants
        .iter()
        .map(|i| i.date_naive())
        .collect::<BTreeSet<_>>()
        .len();

    let mut dream_types: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        *dream_types.entry(record.type_or_default().to_string()).or_insert(0) += 1;
    }

    AnalyticsSummary {
        total_dreams: records.len(),
        avg_quality,
        top_emotion: top_value(records, Dimension::Emotions).unwrap_or_else(|| NO_DATA.to_string()),
        top_theme: top_value(records, Dimension::Themes).unwrap_or_else(|| NO_DATA.to_string()),
        last_dream_date,
        recorded_days,
        dream_types,
    }
}

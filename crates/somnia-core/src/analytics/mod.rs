//! Analytics engines
//!
//! Pure, synchronous projections of a dream record collection. None of them
//! touch storage or mutate their input, so they can run concurrently and
//! always return the same output for the same records.
//!
//! - **Distribution** - frequency counts over categorical fields
//! - **Time series** - daily quality trend and frequency by week/month
//! - **Patterns** - weekday and time-of-day histograms
//! - **Summary** - top-level KPIs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use somnia_core::analytics::{distribution, Dimension};
//!
//! let records = db.list_dreams()?;
//! for datum in distribution(&records, Dimension::Emotions) {
//!     println!("{} {} {}", datum.name, datum.count, datum.color);
//! }
//! ```

pub mod distribution;
pub mod palette;
pub mod patterns;
pub mod summary;
pub mod timeseries;

pub use distribution::{distribution, distribution_by, top_n, top_value, Dimension};
pub use palette::{color_for, procedural_color, Lexicon};
pub use patterns::{
    patterns, patterns_with_slots, time_of_day_histogram, weekday_histogram, SlotTable, TimeSlot,
};
pub use summary::summarize;
pub use timeseries::{
    bucket_by_period, frequency_by_period, group_by_day, month_key, moving_average, quality_trend,
    quality_trend_with_window, week_key, Period,
};

use serde::{Deserialize, Serialize};

use crate::config::AnalyticsConfig;
use crate::models::{AnalyticsSummary, DreamRecord, FrequencyDatum, PatternReport, QualityPoint};

/// Every engine output for one record collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub summary: AnalyticsSummary,
    pub emotions: Vec<FrequencyDatum>,
    pub themes: Vec<FrequencyDatum>,
    pub archetypes: Vec<FrequencyDatum>,
    pub symbols: Vec<FrequencyDatum>,
    pub quality_trend: Vec<QualityPoint>,
    pub patterns: PatternReport,
}

impl AnalyticsSnapshot {
    pub fn compute(records: &[DreamRecord], config: &AnalyticsConfig) -> Self {
        Self {
            summary: summarize(records),
            emotions: distribution(records, Dimension::Emotions),
            themes: distribution(records, Dimension::Themes),
            archetypes: distribution(records, Dimension::Archetypes),
            symbols: distribution(records, Dimension::Symbols),
            quality_trend: quality_trend_with_window(records, config.moving_average_window),
            patterns: patterns(records),
        }
    }
}

//! Weekday and time-of-day histograms

use chrono::{Datelike, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{DreamRecord, PatternReport, TimeSlotCount, WeekdayCount};

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// A half-open hour range `[start, end)`; wraps past midnight when `start > end`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub name: String,
    pub start_hour: u32,
    pub end_hour: u32,
}

impl TimeSlot {
    pub fn new(name: impl Into<String>, start_hour: u32, end_hour: u32) -> Self {
        Self {
            name: name.into(),
            start_hour,
            end_hour,
        }
    }

    pub fn contains(&self, hour: u32) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

/// Ordered set of time-of-day slots; the first matching slot wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTable {
    pub slots: Vec<TimeSlot>,
}

impl Default for SlotTable {
    fn default() -> Self {
        Self {
            slots: vec![
                TimeSlot::new("Midnight", 1, 5),
                TimeSlot::new("Morning", 5, 9),
                TimeSlot::new("Noon", 9, 13),
                TimeSlot::new("Afternoon", 13, 17),
                TimeSlot::new("Evening", 17, 21),
                TimeSlot::new("Night", 21, 1),
            ],
        }
    }
}

impl SlotTable {
    pub fn new(slots: Vec<TimeSlot>) -> Self {
        Self { slots }
    }

    /// Name of the slot containing `hour`, if any
    pub fn classify_hour(&self, hour: u32) -> Option<&str> {
        self.slots
            .iter()
            .find(|slot| slot.contains(hour))
            .map(|slot| slot.name.as_str())
    }
}

/// Record count per weekday, Monday first; all seven days are always present
pub fn weekday_histogram(records: &[DreamRecord]) -> Vec<WeekdayCount> {
    let mut counts = [0usize; 7];
    for record in records {
        let weekday = record.dream_instant().weekday();
        counts[weekday.num_days_from_monday() as usize] += 1;
    }

    WEEKDAYS
        .iter()
        .zip(counts)
        .map(|(day, count)| WeekdayCount {
            weekday: day.to_string(),
            count,
        })
        .collect()
}

/// Record count per slot in table order, plus the number left unclassified
pub fn time_of_day_histogram(records: &[DreamRecord], table: &SlotTable) -> (Vec<TimeSlotCount>, usize) {
    let mut counts = vec![0usize; table.slots.len()];
    let mut unclassified = 0;

    for record in records {
        let hour = record.dream_instant().hour();
        match table.slots.iter().position(|slot| slot.contains(hour)) {
            Some(i) => counts[i] += 1,
            None => {
                tracing::debug!(id = record.id, hour, "Hour matches no time slot");
                unclassified += 1;
            }
        }
    }

    let histogram = table
        .slots
        .iter()
        .zip(counts)
        .map(|(slot, count)| TimeSlotCount {
            slot: slot.name.clone(),
            count,
        })
        .collect();

    (histogram, unclassified)
}

/// Both histograms over the default slot table
pub fn patterns(records: &[DreamRecord]) -> PatternReport {
    patterns_with_slots(records, &SlotTable::default())
}

pub fn patterns_with_slots(records: &[DreamRecord], table: &SlotTable) -> PatternReport {
    let (time_of_day, unclassified) = time_of_day_histogram(records, table);
    PatternReport {
        weekdays: weekday_histogram(records),
        time_of_day,
        unclassified,
    }
}

//! Analytics command implementations

use anyhow::{bail, Context, Result};
use somnia_core::analytics::{
    distribution, frequency_by_period, patterns, quality_trend_with_window, summarize, Dimension,
    Period,
};
use somnia_core::config::SomniaConfig;
use somnia_core::db::Database;

use super::truncate;

/// Width of the bar charts in characters
const BAR_WIDTH: usize = 30;

fn bar(count: usize, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let len = (count * BAR_WIDTH).div_ceil(max);
    "█".repeat(len)
}

fn rating(value: Option<f64>) -> String {
    value.map_or_else(|| "   -".to_string(), |v| format!("{:>4.2}", v))
}

pub fn cmd_stats(db: &Database, json: bool) -> Result<()> {
    let dreams = db.list_dreams()?;
    let summary = summarize(&dreams);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    println!("📊 Journal Summary");
    println!("   ─────────────────────────────");
    println!("   Dreams recorded:  {}", summary.total_dreams);
    println!("   Days with dreams: {}", summary.recorded_days);
    println!("   Average clarity:  {:.1}", summary.avg_quality);
    println!("   Top emotion:      {}", summary.top_emotion);
    println!("   Top theme:        {}", summary.top_theme);
    println!("   Last dream:       {}", summary.last_dream_date);

    if !summary.dream_types.is_empty() {
        println!();
        println!("   By type:");
        for (dream_type, count) in &summary.dream_types {
            println!("     {:<12} {}", dream_type, count);
        }
    }

    Ok(())
}

pub fn cmd_distribution(db: &Database, dimension: Dimension, limit: Option<usize>) -> Result<()> {
    let dreams = db.list_dreams()?;
    let mut data = distribution(&dreams, dimension);
    if let Some(limit) = limit {
        data.truncate(limit);
    }

    if data.is_empty() {
        println!("No {} recorded yet.", dimension);
        return Ok(());
    }

    let max = data.first().map(|d| d.count).unwrap_or(0);

    println!();
    println!("📈 {} ({} distinct)", dimension, data.len());
    println!("   ─────────────────────────────────────────────────────────────");
    for datum in &data {
        println!(
            "   {:<20} {:>4} {} {}",
            truncate(&datum.name, 20),
            datum.count,
            datum.color,
            bar(datum.count, max)
        );
    }

    Ok(())
}

pub fn cmd_trend(db: &Database, window: Option<usize>) -> Result<()> {
    let window = match window {
        Some(0) => bail!("--window must be at least 1"),
        Some(w) => w,
        None => {
            SomniaConfig::load()
                .context("Failed to load configuration")?
                .analytics
                .moving_average_window
        }
    };

    let dreams = db.list_dreams()?;
    let trend = quality_trend_with_window(&dreams, window);

    if trend.is_empty() {
        println!("No dreams recorded yet.");
        return Ok(());
    }

    println!();
    println!("📉 Quality Trend (window {})", window);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Day          Clarity  Smoothed   Sleep  Smoothed");
    for point in &trend {
        println!(
            "   {}  {}     {}    {}     {}",
            point.day,
            rating(point.mean_clarity),
            rating(point.smoothed_clarity),
            rating(point.mean_sleep_quality),
            rating(point.smoothed_sleep_quality)
        );
    }
    if trend.len() < window {
        println!();
        println!("   💡 Smoothing starts once {} days have dreams", window);
    }

    Ok(())
}

pub fn cmd_frequency(db: &Database, period: Period) -> Result<()> {
    let dreams = db.list_dreams()?;
    let data = frequency_by_period(&dreams, period);

    if data.is_empty() {
        println!("No dreams recorded yet.");
        return Ok(());
    }

    println!();
    println!("🗓️  Dreams per {}", period);
    println!("   ─────────────────────────────────────────────────────────────");

    let max = data
        .iter()
        .filter(|d| d.is_total())
        .map(|d| d.count)
        .max()
        .unwrap_or(0);

    for datum in &data {
        match &datum.dream_type {
            None => println!("   {:<10} {:>4} {}", datum.period, datum.count, bar(datum.count, max)),
            Some(dream_type) => println!("   {:<10}   └ {:<10} {}", "", dream_type, datum.count),
        }
    }

    Ok(())
}

pub fn cmd_patterns(db: &Database) -> Result<()> {
    let dreams = db.list_dreams()?;
    let report = patterns(&dreams);

    let weekday_max = report.weekdays.iter().map(|w| w.count).max().unwrap_or(0);
    let slot_max = report.time_of_day.iter().map(|s| s.count).max().unwrap_or(0);

    println!();
    println!("📅 By Weekday");
    println!("   ─────────────────────────────");
    for day in &report.weekdays {
        println!("   {:<4} {:>4} {}", day.weekday, day.count, bar(day.count, weekday_max));
    }

    println!();
    println!("🕐 By Time of Day");
    println!("   ─────────────────────────────");
    for slot in &report.time_of_day {
        println!("   {:<10} {:>4} {}", slot.slot, slot.count, bar(slot.count, slot_max));
    }
    if report.unclassified > 0 {
        println!("   ({} outside every slot)", report.unclassified);
    }

    Ok(())
}

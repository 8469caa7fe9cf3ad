//! Locally synthesized insight payloads
//!
//! Used when the journal is too small for the generator and as the fallback
//! whenever generation fails. Output depends only on the record count, the
//! summary and the supplied timestamp.

use chrono::{DateTime, Utc};

use super::types::{InsightPayload, InsightSource, SubInsight};
use crate::models::{AnalyticsSummary, NO_DATA};

/// Journals at or above this size get the "established" guidance
pub const ESTABLISHED_THRESHOLD: usize = 15;

/// Guidance tier by record count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderTier {
    /// No dreams yet
    Empty,
    /// Exactly one dream
    First,
    /// 2 to 14 dreams
    Emerging,
    /// 15 or more dreams
    Established,
}

impl PlaceholderTier {
    pub fn for_count(count: usize) -> Self {
        match count {
            0 => Self::Empty,
            1 => Self::First,
            n if n < ESTABLISHED_THRESHOLD => Self::Emerging,
            _ => Self::Established,
        }
    }
}

/// Placeholder payload for a journal of `count` dreams
pub fn placeholder_payload(count: usize, summary: &AnalyticsSummary, now: DateTime<Utc>) -> InsightPayload {
    let top_emotion = known(&summary.top_emotion);
    let top_theme = known(&summary.top_theme);

    let (main_insight, sub_insights, pattern, suggestion, next_focus) = match PlaceholderTier::for_count(count) {
        PlaceholderTier::Empty => (
            "Your dream journal is waiting for its first entry.".to_string(),
            vec![SubInsight::new(
                "Getting started",
                "Write down whatever you remember right after waking, even a single image or feeling.",
                "journal",
            )],
            "Not enough dreams yet to see patterns.".to_string(),
            "Keep a notebook or your phone by the bed so you can record dreams before they fade."
                .to_string(),
            vec![
                "Record one dream this week".to_string(),
                "Note how you feel on waking".to_string(),
            ],
        ),
        PlaceholderTier::First => {
            let main = match top_emotion {
                Some(emotion) => format!(
                    "You've recorded your first dream, and it carried a sense of {}.",
                    emotion
                ),
                None => "You've recorded your first dream. Patterns appear as the journal grows."
                    .to_string(),
            };
            (
                main,
                vec![SubInsight::new(
                    "A first step",
                    "One dream is a snapshot. A few more entries will start to show what repeats.",
                    "summary",
                )],
                "Patterns need at least a couple of dreams to compare.".to_string(),
                "Try to journal again within the next few days while the habit is fresh."
                    .to_string(),
                vec![
                    "Record your next dream".to_string(),
                    "Rate sleep quality and clarity each time".to_string(),
                ],
            )
        }
        PlaceholderTier::Emerging => {
            let mut subs = Vec::new();
            if let Some(emotion) = top_emotion {
                subs.push(SubInsight::new(
                    "Leading emotion",
                    format!("{} leads the emotions you have recorded so far.", capitalize(emotion)),
                    "emotions",
                ));
            }
            if let Some(theme) = top_theme {
                subs.push(SubInsight::new(
                    "Leading theme",
                    format!("So far your most frequent theme is {}.", theme),
                    "themes",
                ));
            }
            subs.push(SubInsight::new(
                "Building a picture",
                format!(
                    "{} more dreams will give a much clearer view of your patterns.",
                    ESTABLISHED_THRESHOLD - count
                ),
                "summary",
            ));
            (
                format!("With {} dreams recorded, patterns are beginning to form.", count),
                subs,
                pattern_sentence(top_emotion, top_theme),
                "Keep journaling regularly and tag emotions and themes so patterns stand out."
                    .to_string(),
                vec![
                    "Notice which emotions repeat".to_string(),
                    "Tag themes and symbols as you write".to_string(),
                ],
            )
        }
        PlaceholderTier::Established => {
            let main = match (top_emotion, top_theme) {
                (Some(emotion), Some(theme)) => format!(
                    "Across {} dreams, {} is your most frequent emotion and {} your most common theme.",
                    count, emotion, theme
                ),
                (Some(emotion), None) => format!(
                    "Across {} dreams, {} is your most frequent emotion.",
                    count, emotion
                ),
                (None, Some(theme)) => {
                    format!("Across {} dreams, {} is your most common theme.", count, theme)
                }
                (None, None) => format!(
                    "You've recorded {} dreams, a solid base for spotting patterns.",
                    count
                ),
            };
            let mut subs = vec![SubInsight::new(
                "Journal habit",
                format!(
                    "You've journaled on {} different days.",
                    summary.recorded_days
                ),
                "summary",
            )];
            if summary.avg_quality > 0.0 {
                subs.push(SubInsight::new(
                    "Dream clarity",
                    format!(
                        "Your dreams average {:.1} out of 5 for clarity.",
                        summary.avg_quality
                    ),
                    "quality",
                ));
            }
            subs.push(SubInsight::new(
                "Rhythm",
                "Compare the weekday and time-of-day charts to see when dreams are most vivid.",
                "patterns",
            ));
            (
                main,
                subs,
                pattern_sentence(top_emotion, top_theme),
                "Look back over dreams that share your top theme and note what was happening in waking life."
                    .to_string(),
                vec![
                    "Watch for your most common theme".to_string(),
                    "Track how sleep quality relates to clarity".to_string(),
                    "Notice recurring symbols".to_string(),
                ],
            )
        }
    };

    InsightPayload {
        main_insight,
        sub_insights,
        pattern,
        suggestion,
        next_focus,
        timestamp: now,
        dream_count: count,
        source: InsightSource::Placeholder,
    }
}

fn known(value: &str) -> Option<&str> {
    Some(value).filter(|v| !v.is_empty() && *v != NO_DATA)
}

fn pattern_sentence(emotion: Option<&str>, theme: Option<&str>) -> String {
    match (emotion, theme) {
        (Some(e), Some(t)) => format!("{} and {} appear together often.", capitalize(e), t),
        (Some(e), None) => format!("{} is the emotion you record most.", capitalize(e)),
        (None, Some(t)) => format!("{} is the theme you record most.", capitalize(t)),
        (None, None) => "No single emotion or theme stands out yet.".to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

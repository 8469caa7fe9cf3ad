//! Frequency distributions over categorical record fields

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::palette::{color_for, Lexicon};
use crate::models::{DreamRecord, FrequencyDatum};

/// A categorical field of a dream record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Emotions felt during the dream (multi-valued)
    Emotions,
    /// Emotion on waking (single-valued)
    AfterEmotions,
    Themes,
    /// Archetype tags
    Archetypes,
    /// Structured symbols merged with the legacy flat list
    Symbols,
    Characters,
    Places,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Emotions => "emotions",
            Dimension::AfterEmotions => "after_emotions",
            Dimension::Themes => "themes",
            Dimension::Archetypes => "archetypes",
            Dimension::Symbols => "symbols",
            Dimension::Characters => "characters",
            Dimension::Places => "places",
        }
    }

    pub fn all() -> &'static [Dimension] {
        &[
            Dimension::Emotions,
            Dimension::AfterEmotions,
            Dimension::Themes,
            Dimension::Archetypes,
            Dimension::Symbols,
            Dimension::Characters,
            Dimension::Places,
        ]
    }

    fn lexicon(&self) -> Lexicon {
        match self {
            Dimension::Emotions | Dimension::AfterEmotions => Lexicon::Emotions,
            Dimension::Themes => Lexicon::Themes,
            Dimension::Archetypes => Lexicon::Archetypes,
            Dimension::Symbols => Lexicon::Symbols,
            Dimension::Characters | Dimension::Places => Lexicon::None,
        }
    }

    /// Raw values of this dimension on one record, in record order
    pub fn values<'a>(&self, record: &'a DreamRecord) -> Vec<&'a str> {
        match self {
            Dimension::Emotions => record.emotions.during_dream.iter().map(String::as_str).collect(),
            Dimension::AfterEmotions => record.emotions.after_dream.as_deref().into_iter().collect(),
            Dimension::Themes => record.themes.iter().map(String::as_str).collect(),
            Dimension::Archetypes => record.tags.iter().map(String::as_str).collect(),
            Dimension::Symbols => record
                .elements
                .symbols
                .iter()
                .chain(record.symbols.iter())
                .map(String::as_str)
                .collect(),
            Dimension::Characters => record.elements.characters.iter().map(String::as_str).collect(),
            Dimension::Places => record.elements.places.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "emotions" | "emotion" => Ok(Dimension::Emotions),
            "after_emotions" | "after" | "after_dream" => Ok(Dimension::AfterEmotions),
            "themes" | "theme" => Ok(Dimension::Themes),
            "archetypes" | "archetype" | "tags" => Ok(Dimension::Archetypes),
            "symbols" | "symbol" => Ok(Dimension::Symbols),
            "characters" | "people" => Ok(Dimension::Characters),
            "places" | "place" => Ok(Dimension::Places),
            _ => Err(format!("Unknown dimension: {}", s)),
        }
    }
}

/// Count how often each value of `dimension` occurs across `records`
///
/// Sorted by count, highest first. Equal counts keep the order in which the
/// values were first seen. Values are trimmed, blanks are dropped, and a value
/// listed twice on one record (in any letter case) counts once for it.
pub fn distribution(records: &[DreamRecord], dimension: Dimension) -> Vec<FrequencyDatum> {
    distribution_by(records, dimension.lexicon(), |r| dimension.values(r))
}

/// Like [`distribution`], keeping only the first `limit` entries
pub fn top_n(records: &[DreamRecord], dimension: Dimension, limit: usize) -> Vec<FrequencyDatum> {
    let mut data = distribution(records, dimension);
    data.truncate(limit);
    data
}

/// Most frequent value of a dimension, if any record declares one
pub fn top_value(records: &[DreamRecord], dimension: Dimension) -> Option<String> {
    distribution(records, dimension)
        .into_iter()
        .next()
        .map(|d| d.name)
}

/// Distribution over an arbitrary extractor
pub fn distribution_by<'a, F>(
    records: &'a [DreamRecord],
    lexicon: Lexicon,
    extract: F,
) -> Vec<FrequencyDatum>
where
    F: Fn(&'a DreamRecord) -> Vec<&'a str>,
{
    // (display name, count) in first-seen order, indexed by lower-cased key
    let mut entries: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let mut seen_in_record: Vec<String> = Vec::new();

        for raw in extract(record) {
            let name = raw.trim();
            if name.is_empty() {
                continue;
            }
            let key = name.to_lowercase();
            if seen_in_record.contains(&key) {
                continue;
            }

            match index.get(&key) {
                Some(&i) => entries[i].1 += 1,
                None => {
                    index.insert(key.clone(), entries.len());
                    entries.push((name, 1));
                }
            }
            seen_in_record.push(key);
        }
    }

    // Stable sort keeps first-seen order among equal counts
    entries.sort_by(|a, b| b.1.cmp(&a.1));

    entries
        .into_iter()
        .map(|(name, count)| FrequencyDatum {
            name: name.to_string(),
            count,
            color: color_for(lexicon, name),
        })
        .collect()
}

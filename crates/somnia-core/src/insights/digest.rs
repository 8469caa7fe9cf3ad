//! Bounded request sent to the narrative generator

use serde::{Deserialize, Serialize};

use crate::analytics::AnalyticsSnapshot;
use crate::config::SomniaConfig;
use crate::models::{AnalyticsSummary, DreamRecord, FrequencyDatum, PatternReport, QualityPoint};

/// One recent dream, reduced to what the generator needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DreamDigest {
    /// Normalized calendar day (`YYYY-MM-DD`)
    pub date: String,
    pub title: String,
    /// Whitespace-collapsed content, cut at a character limit
    pub excerpt: String,
    pub emotions: Vec<String>,
    pub themes: Vec<String>,
    pub dream_type: String,
    pub is_lucid: bool,
    pub is_recurring: bool,
}

impl DreamDigest {
    pub fn from_record(record: &DreamRecord, excerpt_chars: usize) -> Self {
        Self {
            date: record.dream_day().format("%Y-%m-%d").to_string(),
            title: record.title.trim().to_string(),
            excerpt: excerpt(&record.content, excerpt_chars),
            emotions: record.emotions.during_dream.clone(),
            themes: record.themes.clone(),
            dream_type: record.type_or_default().to_string(),
            is_lucid: record.is_lucid,
            is_recurring: record.is_recurring,
        }
    }
}

/// Aggregated analytics plus a capped digest of recent dreams
///
/// Size is bounded by the config limits, never by the journal size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeRequest {
    pub dream_count: usize,
    pub summary: AnalyticsSummary,
    pub emotions: Vec<FrequencyDatum>,
    pub themes: Vec<FrequencyDatum>,
    pub archetypes: Vec<FrequencyDatum>,
    pub symbols: Vec<FrequencyDatum>,
    /// Most recent daily quality points, ascending by day
    pub quality_trend: Vec<QualityPoint>,
    pub patterns: PatternReport,
    /// Most recent dreams, newest first
    pub recent_dreams: Vec<DreamDigest>,
}

impl NarrativeRequest {
    pub fn build(records: &[DreamRecord], config: &SomniaConfig) -> Self {
        let limits = &config.insights;
        let mut snapshot = AnalyticsSnapshot::compute(records, &config.analytics);

        for data in [
            &mut snapshot.emotions,
            &mut snapshot.themes,
            &mut snapshot.archetypes,
            &mut snapshot.symbols,
        ] {
            data.truncate(limits.top_n);
        }

        let trend_start = snapshot.quality_trend.len().saturating_sub(limits.trend_points);
        let quality_trend = snapshot.quality_trend.split_off(trend_start);

        let mut recent: Vec<_> = records.iter().map(|r| (r.dream_instant(), r)).collect();
        // Newest first; equal instants keep the later-saved record first
        recent.sort_by(|(a, ra), (b, rb)| b.cmp(a).then(rb.id.cmp(&ra.id)));
        let recent_dreams = recent
            .into_iter()
            .take(limits.digest_limit)
            .map(|(_, record)| DreamDigest::from_record(record, limits.excerpt_chars))
            .collect();

        Self {
            dream_count: records.len(),
            summary: snapshot.summary,
            emotions: snapshot.emotions,
            themes: snapshot.themes,
            archetypes: snapshot.archetypes,
            symbols: snapshot.symbols,
            quality_trend,
            patterns: snapshot.patterns,
            recent_dreams,
        }
    }

    /// JSON of everything except the digest, for the prompt's analytics slot
    pub fn analytics_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&serde_json::json!({
            "summary": self.summary,
            "emotions": self.emotions,
            "themes": self.themes,
            "archetypes": self.archetypes,
            "symbols": self.symbols,
            "qualityTrend": self.quality_trend,
            "patterns": self.patterns,
        }))
    }

    pub fn digest_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.recent_dreams)
    }
}

/// Collapse whitespace and keep at most `max_chars` characters
fn excerpt(content: &str, max_chars: usize) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::DreamBuilder;

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        assert_eq!(excerpt("  a  b\n c ", 10), "a b c");
        assert_eq!(excerpt("ñandú sueño", 5), "ñandú...");
        assert_eq!(excerpt("", 5), "");
    }

    #[test]
    fn test_request_is_bounded() {
        let mut config = SomniaConfig::default();
        config.insights.digest_limit = 3;
        config.insights.trend_points = 2;
        config.insights.top_n = 1;
        config.insights.excerpt_chars = 10;

        let records: Vec<_> = (1..=6)
            .map(|d| {
                DreamBuilder::new()
                    .date(&format!("2024-04-{:02}", d))
                    .title(&format!("Dream {}", d))
                    .content(&"long content ".repeat(20))
                    .emotions(&["calm", "joy"])
                    .clarity(3)
                    .build()
            })
            .collect();

        let request = NarrativeRequest::build(&records, &config);
        assert_eq!(request.dream_count, 6);
        assert_eq!(request.recent_dreams.len(), 3);
        assert_eq!(request.recent_dreams[0].date, "2024-04-06");
        assert_eq!(request.recent_dreams[0].title, "Dream 6");
        assert_eq!(request.recent_dreams[0].excerpt.chars().count(), 13);
        assert_eq!(request.emotions.len(), 1);
        assert_eq!(request.quality_trend.len(), 2);
        assert_eq!(
            request.quality_trend[1].day,
            chrono::NaiveDate::from_ymd_opt(2024, 4, 6).unwrap()
        );
    }

    #[test]
    fn test_prompt_json_sections() {
        let records = vec![
            DreamBuilder::new().date("2024-04-01").themes(&["school"]).build(),
            DreamBuilder::new().date("2024-04-02").themes(&["school"]).build(),
        ];
        let request = NarrativeRequest::build(&records, &SomniaConfig::default());

        let analytics = request.analytics_json().unwrap();
        assert!(analytics.contains("\"totalDreams\": 2"));
        assert!(!analytics.contains("recentDreams"));
        assert!(request.digest_json().unwrap().contains("2024-04-02"));
    }
}

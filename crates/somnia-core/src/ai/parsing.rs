//! JSON parsing helpers for narrative generator responses
//!
//! Models often wrap the JSON payload in prose or code fences, and they do not
//! always follow the requested shape. Parsing is lenient: the first balanced
//! `{...}` object is extracted, keys with the wrong type count as missing,
//! and only a response with no usable insight text at all is rejected.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::insights::{GeneratedInsight, SubInsight};

/// Title given to sub-insights the model left untitled
const UNTITLED: &str = "Insight";

/// Source given to sub-insights the model left unattributed
const UNATTRIBUTED: &str = "narrative";

/// Find the first balanced JSON object in a model response
pub fn extract_json_object(response: &str) -> Result<&str> {
    let start = response
        .find('{')
        .ok_or_else(|| Error::Generation(format!("No JSON found in response | Raw: {}", truncate(response))))?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in response[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&response[start..=start + i]);
                }
            }
            _ => {}
        }
    }

    Err(Error::Generation(format!(
        "Unbalanced JSON in response | Raw: {}",
        truncate(response)
    )))
}

/// Parse a narrative generator response
///
/// Fails only when no JSON object is present or when it carries neither a
/// `mainInsight` nor any `subInsights`.
pub fn parse_insight_response(response: &str) -> Result<GeneratedInsight> {
    let json = extract_json_object(response)?;
    let value: Value = serde_json::from_str(json)
        .map_err(|e| Error::Generation(format!("Invalid JSON from model: {} | Raw: {}", e, truncate(json))))?;
    let object = value
        .as_object()
        .ok_or_else(|| Error::Generation("Model response is not a JSON object".into()))?;

    let insight = GeneratedInsight {
        main_insight: text_field(object, "mainInsight"),
        sub_insights: sub_insights(object.get("subInsights")),
        pattern: text_field(object, "pattern"),
        suggestion: text_field(object, "suggestion"),
        next_focus: string_list(object.get("nextFocus")),
    };

    if insight.main_insight.is_none() && insight.sub_insights.is_empty() {
        return Err(Error::Generation(
            "Model response has neither mainInsight nor subInsights".into(),
        ));
    }

    Ok(insight)
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn sub_insights(value: Option<&Value>) -> Vec<SubInsight> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(text) if !text.trim().is_empty() => {
                Some(SubInsight::new(UNTITLED, text.trim(), UNATTRIBUTED))
            }
            Value::Object(fields) => {
                let content = text_field(fields, "content")?;
                Some(SubInsight::new(
                    text_field(fields, "title").unwrap_or_else(|| UNTITLED.to_string()),
                    content,
                    text_field(fields, "source").unwrap_or_else(|| UNATTRIBUTED.to_string()),
                ))
            }
            _ => None,
        })
        .collect()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Some(Value::String(single)) if !single.trim().is_empty() => vec![single.trim().to_string()],
        _ => Vec::new(),
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() > 200 {
        format!("{}...", text.chars().take(200).collect::<String>())
    } else {
        text.to_string()
    }
}

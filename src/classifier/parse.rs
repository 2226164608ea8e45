//! Turns the vision model's free-text answer into a structured verdict.
//!
//! The model is asked for `ACTIVITY TYPE:`, `ACTIVITY:` and `REASONING:`
//! lines but does not reliably comply, so every field has a fallback.

use crate::models::ActivityLabel;
use crate::utils::truncate_chars;

const UNSPECIFIED_ACTIVITY: &str = "unspecified activity";
const REASONING_EXCERPT_CHARS: usize = 150;

const KEY_ACTIVITY_TYPE: &str = "activity type";
const KEY_ACTIVITY: &str = "activity";
const KEY_REASONING: &str = "reasoning";

// Checked before the bare word so "unproductive" is not read as productive.
const NEGATED_PRODUCTIVE: [&str; 3] = ["unproductive", "non-productive", "not productive"];

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub label: ActivityLabel,
    pub description: String,
    pub reasoning: String,
}

pub fn parse_response(raw: &str) -> ParsedResponse {
    let mut label = None;
    let mut description = None;
    let mut reasoning = None;

    for line in raw.lines() {
        if let Some(value) = labeled_value(line, KEY_ACTIVITY_TYPE) {
            if label.is_none() {
                label = label_from_text(value);
            }
            continue;
        }
        if let Some(value) = labeled_value(line, KEY_ACTIVITY) {
            if description.is_none() && !value.is_empty() {
                description = Some(value.to_string());
            }
            continue;
        }
        if let Some(value) = labeled_value(line, KEY_REASONING) {
            if reasoning.is_none() && !value.is_empty() {
                reasoning = Some(value.to_string());
            }
        }
    }

    let label = label
        .or_else(|| keyword_label(raw))
        .unwrap_or(ActivityLabel::Unknown);

    let description = description
        .or_else(|| narrated_activity(raw))
        .unwrap_or_else(|| UNSPECIFIED_ACTIVITY.to_string());

    let reasoning = reasoning
        .unwrap_or_else(|| truncate_chars(raw.trim(), REASONING_EXCERPT_CHARS).to_string());

    ParsedResponse {
        label,
        description,
        reasoning,
    }
}

/// Value of a `key: value` / `key = value` line, ignoring case and any
/// markdown bullets or bold markers around the key.
fn labeled_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let line = line
        .trim()
        .trim_start_matches(|c: char| matches!(c, '*' | '-' | '#' | '>') || c.is_whitespace());

    if line.len() < key.len() || !line.is_char_boundary(key.len()) {
        return None;
    }
    let (head, rest) = line.split_at(key.len());
    if !head.eq_ignore_ascii_case(key) {
        return None;
    }

    let rest = rest.trim_start_matches('*').trim_start();
    let value = rest.strip_prefix(':').or_else(|| rest.strip_prefix('='))?;
    Some(value.trim().trim_matches('*').trim())
}

/// Label for an `ACTIVITY TYPE` value. Negated forms read as distracting.
fn label_from_text(text: &str) -> Option<ActivityLabel> {
    let lower = text.to_lowercase();
    if NEGATED_PRODUCTIVE.iter().any(|marker| lower.contains(marker)) {
        Some(ActivityLabel::Distracting)
    } else {
        keyword_label(&lower)
    }
}

/// Plain keyword search over free text, without negation handling.
fn keyword_label(text: &str) -> Option<ActivityLabel> {
    let lower = text.to_lowercase();
    if lower.contains("productive") {
        Some(ActivityLabel::Productive)
    } else if lower.contains("distracting") {
        Some(ActivityLabel::Distracting)
    } else {
        None
    }
}

/// First sentence that narrates what the user is doing.
fn narrated_activity(raw: &str) -> Option<String> {
    raw.split('.')
        .find(|sentence| {
            let lower = sentence.to_lowercase();
            lower.contains("you are") || lower.contains("user is")
        })
        .map(|sentence| sentence.trim().to_string())
        .filter(|sentence| !sentence.is_empty())
}

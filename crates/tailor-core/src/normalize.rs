//! Best-effort normalization of provider completions into a [`ResumeRecord`].
//!
//! Language-model output is not guaranteed to be JSON. The normalizer strips
//! the code fences models add despite instructions, parses strictly, and
//! falls back to a fixed record shape instead of returning an error.

use serde_json::Value;

use crate::models::{ParseOutcome, ResumeRecord, TailoredResume};

/// Summary line of the fallback record.
pub const FALLBACK_MESSAGE: &str = "Error parsing AI response. Please try again.";

/// Top-level keys a well-formed response is expected to carry.
const EXPECTED_KEYS: [&str; 5] = [
    "executive_summary",
    "personal_info",
    "skills",
    "experience",
    "education",
];

const RAW_EXCERPT_CHARS: usize = 1000;

/// Strips surrounding whitespace and Markdown code fences.
///
/// Removes a leading "```" + `lang` fence, then a bare leading "```", then a
/// trailing "```", in that order.
pub fn strip_code_fence<'a>(text: &'a str, lang: &str) -> &'a str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```").and_then(|r| r.strip_prefix(lang)) {
        text = rest;
    }
    if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// The deterministic record returned when a response cannot be parsed.
pub fn fallback_record() -> ResumeRecord {
    ResumeRecord {
        executive_summary: vec![FALLBACK_MESSAGE.to_string()],
        ..Default::default()
    }
}

/// Turns a completion into a record. Never fails.
pub fn normalize_response(response: &str) -> TailoredResume {
    let cleaned = strip_code_fence(response, "json");

    let value: Value = match serde_json::from_str(cleaned) {
        Ok(value) => value,
        Err(e) => return fallback(response, format!("Invalid JSON: {e}")),
    };

    let Value::Object(map) = &value else {
        return fallback(response, "Expected a JSON object".to_string());
    };
    let missing: Vec<&str> = EXPECTED_KEYS
        .iter()
        .copied()
        .filter(|key| !map.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        tracing::warn!(?missing, "Provider response is missing keys");
    }

    match serde_json::from_value::<ResumeRecord>(value) {
        Ok(record) => {
            tracing::debug!("Parsed structured provider response");
            TailoredResume::parsed(record)
        }
        Err(e) => fallback(response, format!("Unexpected JSON shape: {e}")),
    }
}

fn fallback(raw: &str, reason: String) -> TailoredResume {
    let raw_excerpt: String = raw.chars().take(RAW_EXCERPT_CHARS).collect();
    tracing::warn!(%reason, "Falling back to placeholder record");
    tracing::debug!(%raw_excerpt, "Unusable provider response");
    TailoredResume {
        record: fallback_record(),
        outcome: ParseOutcome::Fallback {
            reason,
            raw_excerpt,
        },
    }
}

//! Turns a `/chat` reply into an ordered list of [`HistoricEvent`]s.
//!
//! Two reply formats are understood:
//!
//! - a JSON array of `"YYYY: text"` strings, either as the body itself or
//!   JSON-encoded inside the `response` field,
//! - a numbered list in free text (`1. 1969 - Summary. Description...`).
//!
//! The body must be JSON; anything else is a [`ParseError`]. Inside a
//! decoded reply the structured array is tried first, and free text is only
//! scanned when the reply text does not hold a JSON array.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

use crate::models::{ChatReply, HistoricEvent};

static NUMBERED_EVENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+\.\s(\d{4})\s-\s([^–\n]+?)\.\s*").expect("numbered event pattern is valid")
});

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").expect("code fence pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Response body is not a recognized reply: {0}")]
    InvalidBody(String),
}

/// Parse a raw `/chat` response body.
///
/// A body that does not decode as a reply is an error; free-text parsing is
/// never attempted on it.
pub fn parse_response_body(body: &str) -> Result<Vec<HistoricEvent>, ParseError> {
    let reply: ChatReply =
        serde_json::from_str(body).map_err(|e| ParseError::InvalidBody(e.to_string()))?;
    Ok(events_from_reply(&reply))
}

pub fn events_from_reply(reply: &ChatReply) -> Vec<HistoricEvent> {
    match reply {
        ChatReply::Events(entries) => events_from_entries(&filter_entries(entries)),
        ChatReply::Wrapped { response, .. } | ChatReply::Text(response) => {
            events_from_text(response)
        }
    }
}

/// Events carried in a `response` string: a JSON array if it decodes as
/// one, otherwise a numbered list.
pub fn events_from_text(text: &str) -> Vec<HistoricEvent> {
    match decode_entries(text) {
        Some(entries) => events_from_entries(&entries),
        None => {
            debug!("Response is not a JSON array, scanning for a numbered list");
            parse_numbered_list(text)
        }
    }
}

/// Decode a JSON array of event strings, tolerating a surrounding markdown
/// code fence. Returns `None` when the text is not a JSON array.
pub fn decode_entries(text: &str) -> Option<Vec<String>> {
    let text = strip_code_fence(text);
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(values)) => Some(filter_entries(&values)),
        _ => None,
    }
}

/// Keep the non-blank string entries, trimmed, in their original order.
pub fn filter_entries(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    CODE_FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |inner| inner.as_str())
}

fn events_from_entries(entries: &[String]) -> Vec<HistoricEvent> {
    entries.iter().map(|entry| event_from_entry(entry)).collect()
}

/// Split a `"YYYY: text"` entry into a year and its remaining text.
///
/// The year is the leading four digits. When the entry does not start with
/// four digits the first four characters are used anyway, so malformed
/// entries produce nonsense years.
pub fn extract_year_and_text(entry: &str) -> (String, String) {
    let entry = entry.trim();
    let has_year = entry.len() >= 4 && entry.bytes().take(4).all(|b| b.is_ascii_digit());
    if !has_year {
        debug!(entry, "Event entry has no leading year");
    }
    let year = entry.chars().take(4).collect();
    let text = entry.chars().skip(4).collect();
    (year, text)
}

pub fn event_from_entry(entry: &str) -> HistoricEvent {
    let (year, text) = extract_year_and_text(entry);
    let title = text
        .trim_start_matches(|c: char| {
            c.is_whitespace() || matches!(c, ':' | '-' | '–' | '—' | ',')
        })
        .trim_end();
    HistoricEvent::new(year, title, "").with_source(entry.trim())
}

/// Scan `1. 1969 - Summary. Description...` runs. Each description spans
/// from the end of its header to the start of the next one.
pub fn parse_numbered_list(text: &str) -> Vec<HistoricEvent> {
    let headers: Vec<_> = NUMBERED_EVENT.captures_iter(text).collect();

    headers
        .iter()
        .enumerate()
        .map(|(i, caps)| {
            let header_end = caps.get(0).map_or(text.len(), |m| m.end());
            let next_start = headers
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(text.len(), |m| m.start());

            let year = caps.get(1).map_or("", |m| m.as_str());
            let title = caps.get(2).map_or("", |m| m.as_str()).trim();
            let description = normalize_description(&text[header_end..next_start]);

            HistoricEvent::new(year, title, description)
        })
        .collect()
}

/// Collapse whitespace and end with exactly one period. A header with no
/// trailing text yields a lone ".".
fn normalize_description(raw: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(raw.trim(), " ");
    format!("{}.", collapsed.trim_end_matches('.'))
}

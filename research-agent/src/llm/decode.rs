//! Best-effort structured decode of model output.
//!
//! Models wrap JSON in prose, code fences, `//` comments and trailing commas.
//! Strategy, in order:
//! 1. the first fenced block, cleaned and parsed;
//! 2. the whole text, cleaned and parsed;
//! 3. the outermost `{...}` or `[...]` slice of the cleaned text.
//!
//! Cleaning is string-literal aware, so `https://` inside a value survives.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::util::excerpt;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").expect("Invalid regex")
});

pub fn decode_json(raw: &str) -> Option<Value> {
    if let Some(block) = FENCED_BLOCK
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    {
        match serde_json::from_str(&clean_json(block)) {
            Ok(value) => return Some(value),
            Err(e) => debug!(error = %e, "fenced block is not valid JSON"),
        }
    }

    let cleaned = clean_json(raw.trim());
    if let Ok(value) = serde_json::from_str(&cleaned) {
        return Some(value);
    }

    if let Some(slice) = outermost_json_slice(&cleaned) {
        if let Ok(value) = serde_json::from_str(slice) {
            return Some(value);
        }
    }

    warn!(response = %excerpt(raw, 200), "could not decode model output as JSON");
    None
}

/// Ranking payloads arrive either as a bare list or as `{"rankings": [...]}`.
pub fn ranking_entries(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => match map.remove("rankings") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

pub fn clean_json(text: &str) -> String {
    strip_trailing_commas(&strip_comments(text))
}

fn strip_comments(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(escaped);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match (c, chars.get(i + 1)) {
            ('"', _) => {
                in_string = true;
                out.push(c);
                i += 1;
            }
            ('/', Some('/')) => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            ('/', Some('*')) => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i = (i + 2).min(chars.len());
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(escaped);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
            if !matches!(next, Some('}') | Some(']')) {
                out.push(c);
            }
        } else {
            out.push(c);
        }
        i += 1;
    }
    out
}

fn outermost_json_slice(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

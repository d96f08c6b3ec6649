//! JSON extraction from free-form model replies.
//!
//! Candidate selection: fenced code block → first balanced `{...}` span → whole text.
//! The candidate is cleaned of trailing commas, parsed strictly, then leniently (JSON5).
//! Failure never escapes: callers get an empty document and decide what that means.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// A JSON object extracted from model output. Empty when nothing usable was found.
pub type Document = Map<String, Value>;

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:[A-Za-z0-9_-]+)?[ \t]*\r?\n?([\s\S]*?)```").unwrap());

static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",(\s*[\]}])").unwrap());

/// Extracts the first JSON object from `text`. Never fails.
pub fn extract_json(text: &str) -> Document {
    let candidate = select_candidate(text);
    let cleaned = strip_trailing_commas(candidate);

    let parsed = match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => Some(value),
        Err(strict_err) => {
            debug!("Strict JSON parse failed ({strict_err}); trying lenient parse");
            match json5::from_str::<Value>(&cleaned) {
                Ok(value) => Some(value),
                Err(lenient_err) => {
                    warn!("Could not parse JSON from model output: {lenient_err}");
                    None
                }
            }
        }
    };

    match parsed {
        Some(Value::Object(map)) => map,
        Some(other) => {
            warn!(
                "Model output parsed as JSON {} instead of an object; discarding",
                json_kind(&other)
            );
            Document::new()
        }
        None => Document::new(),
    }
}

fn select_candidate(text: &str) -> &str {
    if let Some(inner) = FENCED_BLOCK
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
    {
        return inner;
    }
    if let Some(span) = first_object_span(text) {
        return span;
    }
    text.trim()
}

/// Returns the first top-level `{...}` span, respecting string literals.
/// An unbalanced tail falls back to the first `{` through the last `}`.
fn first_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn strip_trailing_commas(candidate: &str) -> String {
    TRAILING_COMMA.replace_all(candidate, "$1").into_owned()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

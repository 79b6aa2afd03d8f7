//! Interpretation of raw model output.
//!
//! List stages take one item per non-empty line with leading list markers
//! removed. The traceability stage expects JSON. Both return
//! [`ParseFailure`] instead of guessing when nothing usable is found; the
//! stages absorb it into an empty result.

use serde_json::{Map, Value};

use crate::result::TraceabilityEntry;

/// Object keys that may wrap the traceability array.
const WRAPPER_KEYS: [&str; 3] = ["traceability_matrix", "traceability", "matrix"];
const REQUIREMENT_KEYS: [&str; 2] = ["requirement", "requirement_id"];
const TESTCASE_KEYS: [&str; 3] = ["testcases", "testcase_ids", "test_cases"];
const BULLETS: &[char] = &['-', '*', '•', '·'];

/// Model output that could not be interpreted.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct ParseFailure {
    reason: String,
}

impl ParseFailure {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// What was wrong with the payload.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Split into trimmed lines without list markers, dropping empty ones.
pub fn normalize_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(strip_marker)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// [`normalize_lines`], failing when the response holds no items at all.
pub fn parse_list(raw: &str) -> Result<Vec<String>, ParseFailure> {
    let items = normalize_lines(raw);
    if items.is_empty() {
        return Err(ParseFailure::new("response contained no list items"));
    }
    Ok(items)
}

fn strip_marker(line: &str) -> &str {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix(BULLETS) {
        return rest.trim();
    }

    let digits = line
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(line.len());
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix(&['.', ')'][..]) {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return rest.trim();
            }
        }
    }
    line
}

/// Parse a traceability payload.
///
/// Accepts a bare array of entries, an object wrapping the array under one
/// of `traceability_matrix`, `traceability` or `matrix`, and either form
/// inside a Markdown code fence.
pub fn parse_traceability(raw: &str) -> Result<Vec<TraceabilityEntry>, ParseFailure> {
    let body = strip_code_fence(raw.trim());
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ParseFailure::new(format!("invalid JSON: {e}")))?;

    let rows = match value {
        Value::Array(rows) => rows,
        Value::Object(mut map) => WRAPPER_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(rows)) => Some(rows),
                _ => None,
            })
            .ok_or_else(|| ParseFailure::new("object has no traceability array"))?,
        other => {
            return Err(ParseFailure::new(format!(
                "expected array or object, got {}",
                type_name(&other)
            )));
        }
    };

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| match row {
            Value::Object(map) => entry_from_object(&map)
                .map_err(|reason| ParseFailure::new(format!("entry {i}: {reason}"))),
            other => Err(ParseFailure::new(format!(
                "entry {i}: expected object, got {}",
                type_name(&other)
            ))),
        })
        .collect()
}

fn entry_from_object(map: &Map<String, Value>) -> Result<TraceabilityEntry, String> {
    let requirement = REQUIREMENT_KEYS
        .iter()
        .find_map(|key| map.get(*key))
        .ok_or("missing requirement")?;
    let requirement = scalar_text(requirement).ok_or("requirement is not text")?;

    let testcases = match TESTCASE_KEYS.iter().find_map(|key| map.get(*key)) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| scalar_text(item).ok_or("test case is not text"))
            .collect::<Result<_, _>>()?,
        Some(single) => vec![scalar_text(single).ok_or("test cases are not text")?],
    };

    Ok(TraceabilityEntry {
        requirement,
        testcases,
    })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(start) = text.find("```") else {
        return text;
    };
    let after = &text[start + 3..];
    let inner = after.rfind("```").map_or(after, |end| &after[..end]);
    // Drop the info string (`json`, etc.); the fence may be on one line.
    inner
        .trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        .trim()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Repair pass for model output that is not quite JSON.
//!
//! Models asked for structured output still wrap it in markdown fences,
//! add `//` comments, or leave trailing commas. The cascade here mirrors
//! what actually shows up in responses; when every attempt fails the
//! extraction fails as a whole, never with a best-guess record.

use crate::error::KeeperError;
use serde_json::Value;

/// Parse model output into JSON, repairing common damage along the way.
///
/// Attempts, in order: the raw text as-is; the first fenced ```json block
/// (else the first top-level `{...}` span) with `//` line comments and
/// trailing commas stripped; and finally the same text with all newline,
/// carriage-return and tab characters removed.
pub fn parse_model_json(raw: &str) -> Result<Value, KeeperError> {
    if let Ok(value) = serde_json::from_str(raw.trim()) {
        return Ok(value);
    }

    let candidate = fenced_json_block(raw)
        .or_else(|| brace_span(raw))
        .unwrap_or(raw)
        .trim();

    let cleaned = strip_trailing_commas(&strip_line_comments(candidate));
    if let Ok(value) = serde_json::from_str(&cleaned) {
        return Ok(value);
    }

    let flattened: String = cleaned
        .chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '\t'))
        .collect();
    serde_json::from_str(&flattened)
        .map_err(|e| KeeperError::UnparseableOutput(e.to_string()))
}

/// The inside of the first ```json ... ``` fence, if any.
fn fenced_json_block(raw: &str) -> Option<&str> {
    let lowered = raw.to_ascii_lowercase();
    let start = lowered.find("```json")? + "```json".len();
    let rest = &raw[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

/// The first `{` through the last `}`, if such a span exists.
fn brace_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end >= start).then(|| &raw[start..=end])
}

/// Remove `//` line comments without touching `//` inside string literals
/// (otherwise every https:// URL in the payload would be mangled).
fn strip_line_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if c == '/' && chars.peek() == Some(&'/') {
            while let Some(&next) = chars.peek() {
                if next == '\n' {
                    break;
                }
                chars.next();
            }
        } else {
            out.push(c);
        }
    }

    out
}

/// Remove commas whose next non-whitespace character closes a bracket.
fn strip_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        if c == '"' {
            in_string = true;
            out.push(c);
            continue;
        }
        if c == ',' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && (chars[j] == ']' || chars[j] == '}') {
                continue;
            }
        }
        out.push(c);
    }

    out
}

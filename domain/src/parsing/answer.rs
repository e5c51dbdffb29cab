//! Option-letter extraction from free-form or structured model output.
//!
//! The chain stops at the first step that yields a letter:
//!
//! 1. **Marker**: the last `ANSWER:` / `FINAL ANSWER:` whose next token
//!    normalizes to a letter (`B`, `B.`, `(B)`, `**B**`, `Option B`).
//! 2. **Structured**: a JSON object (comments and fences tolerated) with one
//!    of the requested fields, e.g. `{"final_answer": "B"}`.
//! 3. **Tail scan**: the last isolated capital `A`-`D` in the final
//!    [`TAIL_WINDOW`] characters.
//!
//! If every step fails the result is an [`AnswerParseError`] carrying the
//! raw text.

use super::json::extract_json_value;
use crate::core::error::AnswerParseError;
use crate::core::question::AnswerLetter;
use crate::core::string::tail_chars;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Characters scanned by the last-resort fallback.
pub const TAIL_WINDOW: usize = 200;

/// JSON fields consulted when the call site does not name its own.
pub const DEFAULT_ANSWER_FIELDS: &[&str] = &["final_answer", "answer"];

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:final\s+)?answer\s*\**\s*(?:is)?\s*:").expect("valid marker regex")
});

/// Parse an option letter using the default JSON fields.
pub fn parse_answer(raw: &str) -> Result<AnswerLetter, AnswerParseError> {
    parse_answer_with_fields(raw, DEFAULT_ANSWER_FIELDS)
}

/// Parse an option letter, reading `fields` in the structured step.
pub fn parse_answer_with_fields(
    raw: &str,
    fields: &[&str],
) -> Result<AnswerLetter, AnswerParseError> {
    if raw.trim().is_empty() {
        return Err(AnswerParseError::new(raw, "empty response"));
    }

    if let Some(letter) = from_marker(raw) {
        return Ok(letter);
    }

    if let Ok(value) = extract_json_value(raw)
        && let Some(letter) = from_json_fields(&value, fields)
    {
        return Ok(letter);
    }

    from_tail(raw).ok_or_else(|| AnswerParseError::new(raw, "no option letter found"))
}

fn from_marker(raw: &str) -> Option<AnswerLetter> {
    let ends: Vec<usize> = MARKER.find_iter(raw).map(|m| m.end()).collect();
    ends.into_iter()
        .rev()
        .find_map(|end| normalize_token(&raw[end..]))
}

fn from_json_fields(value: &Value, fields: &[&str]) -> Option<AnswerLetter> {
    fields
        .iter()
        .filter_map(|field| value.get(*field))
        .find_map(|v| match v {
            Value::String(s) => normalize_token(s),
            _ => None,
        })
}

/// Normalize the token at the start of `text` to a letter.
///
/// Leading whitespace and decoration (`*`, `(`, `[`, quotes) are skipped,
/// as is an `Option` prefix. The letter must not be the start of a word, so
/// `ANSWER: Because ...` does not read as `B`.
pub fn normalize_token(text: &str) -> Option<AnswerLetter> {
    let decoration = |c: char| c.is_whitespace() || matches!(c, '*' | '(' | '[' | '"' | '\'' | '`' | '_');
    let mut rest = text.trim_start_matches(decoration);

    if rest.get(..6).is_some_and(|prefix| prefix.eq_ignore_ascii_case("option"))
        && let Some(after) = rest.get(6..)
    {
        rest = after.trim_start_matches(decoration);
    }

    let mut chars = rest.chars();
    let first = chars.next()?;
    if chars.next().is_some_and(|c| c.is_alphanumeric()) {
        return None;
    }
    AnswerLetter::from_char(first)
}

fn from_tail(raw: &str) -> Option<AnswerLetter> {
    let tail: Vec<char> = tail_chars(raw, TAIL_WINDOW).chars().collect();
    (0..tail.len()).rev().find_map(|i| {
        let c = tail[i];
        if !matches!(c, 'A'..='D') {
            return None;
        }
        let isolated_before = i == 0 || !tail[i - 1].is_alphanumeric();
        let isolated_after = tail.get(i + 1).is_none_or(|n| !n.is_alphanumeric());
        (isolated_before && isolated_after)
            .then(|| AnswerLetter::from_char(c))
            .flatten()
    })
}

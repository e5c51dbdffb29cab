//! Tolerant JSON recovery for model output.
//!
//! Models wrap JSON in markdown fences, add prose before and after it,
//! inject `//` and `/* */` comments, leave trailing commas, and get cut
//! off by the token limit. Everything here is pure text processing.
//!
//! | Problem | Handling |
//! |---------|----------|
//! | ```` ```json ```` fences | stripped |
//! | prose around the object | first balanced `{…}`/`[…]` that parses wins |
//! | `//` and `/* */` comments | removed outside string literals |
//! | comment-like list entries (`"// note"`) | dropped by [`parse_string_list`] |
//! | trailing commas | removed outside string literals |
//! | truncated object | [`AnswerParseError`] with reason `truncated JSON` |

use crate::core::error::AnswerParseError;
use serde_json::Value;

/// Upper bound on opening brackets tried before giving up.
const MAX_CANDIDATES: usize = 16;

/// Extract the first parseable JSON object or array from model output.
///
/// Never panics on malformed input; every failure is an [`AnswerParseError`]
/// carrying the raw text.
pub fn extract_json_value(raw: &str) -> Result<Value, AnswerParseError> {
    let text = strip_code_fences(raw);
    let bytes = text.as_bytes();

    let mut saw_unbalanced = false;
    let mut last_error: Option<String> = None;

    let openers = bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'{' || **b == b'[')
        .map(|(i, _)| i)
        .take(MAX_CANDIDATES);

    for start in openers {
        let Some(end) = find_balanced_end(bytes, start) else {
            saw_unbalanced = true;
            continue;
        };
        let candidate = remove_trailing_commas(&strip_json_comments(&text[start..=end]));
        match serde_json::from_str::<Value>(&candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    let reason = if saw_unbalanced && last_error.is_none() {
        "truncated JSON".to_string()
    } else if let Some(e) = last_error {
        format!("invalid JSON: {}", e)
    } else {
        "no JSON object found".to_string()
    };
    Err(AnswerParseError::new(raw, reason))
}

/// Read the first present string field from a JSON object in `raw`.
pub fn json_string_field(raw: &str, fields: &[&str]) -> Result<String, AnswerParseError> {
    let value = extract_json_value(raw)?;
    fields
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .ok_or_else(|| {
            AnswerParseError::new(raw, format!("missing string field: {}", fields.join(" | ")))
        })
}

/// Read the first present list field from a JSON object in `raw`.
///
/// A bare top-level array is accepted as the list itself.
pub fn json_string_list(raw: &str, fields: &[&str]) -> Result<Vec<String>, AnswerParseError> {
    let value = extract_json_value(raw)?;
    if value.is_array() {
        return Ok(parse_string_list(&value));
    }
    fields
        .iter()
        .find_map(|field| value.get(*field).filter(|v| v.is_array()))
        .map(parse_string_list)
        .ok_or_else(|| {
            AnswerParseError::new(raw, format!("missing list field: {}", fields.join(" | ")))
        })
}

/// Collect the string elements of a JSON array, trimmed, skipping empty
/// entries and entries that are themselves comments (`"// ..."`, `"/* ..."`).
pub fn parse_string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty() && !is_comment_like(s))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn is_comment_like(s: &str) -> bool {
    s.starts_with("//") || s.starts_with("/*")
}

/// Remove a surrounding markdown code fence, if any.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(fence_start) = trimmed.find("```") else {
        return trimmed;
    };
    let after = &trimmed[fence_start + 3..];
    // skip the language tag line
    let body = match after.find('\n') {
        Some(nl) => &after[nl + 1..],
        None => after,
    };
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Index of the bracket closing the one at `start`, skipping string
/// literals and comments. `None` if the input ends first.
fn find_balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut i = start;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = skip_line_comment(bytes, i);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = skip_block_comment(bytes, i);
                continue;
            }
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn skip_line_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|b| *b == b'\n')
        .map_or(bytes.len(), |p| start + p)
}

fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start + 2..]
        .windows(2)
        .position(|w| w == b"*/")
        .map_or(bytes.len(), |p| start + 2 + p + 2)
}

/// Remove `//` and `/* */` comments that appear outside string literals.
pub fn strip_json_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            out.push(b);
            i += 1;
            continue;
        }
        match b {
            b'/' if bytes.get(i + 1) == Some(&b'/') => i = skip_line_comment(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_block_comment(bytes, i),
            _ => {
                if b == b'"' {
                    in_string = true;
                }
                out.push(b);
                i += 1;
            }
        }
    }
    // Comment boundaries are ASCII, so no multi-byte sequence was split.
    String::from_utf8_lossy(&out).into_owned()
}

/// Remove commas directly followed (modulo whitespace) by `}` or `]`.
pub fn remove_trailing_commas(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            out.push(b);
            continue;
        }
        if b == b',' {
            let next = bytes[i + 1..].iter().find(|c| !c.is_ascii_whitespace());
            if matches!(next, Some(b'}') | Some(b']')) {
                continue;
            }
        }
        if b == b'"' {
            in_string = true;
        }
        out.push(b);
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_comment_string_entries_are_dropped() {
        let raw = r#"{"selected": ["cardiology", "// comment", "neurology"]}"#;
        let list = json_string_list(raw, &["selected"]).unwrap();
        assert_eq!(list, vec!["cardiology", "neurology"]);
    }

    #[test]
    fn test_line_and_block_comments_are_stripped() {
        let raw = r#"{
  "selected_specialties": [
    "cardiology", // best fit
    /* second opinion */ "pulmonology",
  ]
}"#;
        let list = json_string_list(raw, &["selected_specialties"]).unwrap();
        assert_eq!(list, vec!["cardiology", "pulmonology"]);
    }

    #[test]
    fn test_urls_inside_strings_survive() {
        let raw = r#"{"note": "see https://example.org/a", "final_answer": "C"}"#;
        let value = extract_json_value(raw).unwrap();
        assert_eq!(value["note"], "see https://example.org/a");
    }

    #[test]
    fn test_fenced_json_with_prose() {
        let raw = "Here is my plan:\n```json\n{\"final_answer\": \"B\"}\n```\nHope this helps.";
        assert_eq!(json_string_field(raw, &["final_answer"]).unwrap(), "B");
    }

    #[test]
    fn test_prose_braces_before_object_are_skipped() {
        let raw = r#"Using the set {A, B} we conclude: {"final_answer": "A"}"#;
        assert_eq!(json_string_field(raw, &["final_answer"]).unwrap(), "A");
    }

    #[test]
    fn test_truncated_json_is_a_parse_error() {
        let raw = r#"{"specialty_id": "cardiology", "differential": [{"dx": "Acute MI", "p": 0.6"#;
        let err = extract_json_value(raw).unwrap_err();
        assert_eq!(err.reason, "truncated JSON");
        assert!(err.raw.contains("cardiology"));
    }

    #[test]
    fn test_no_json_at_all() {
        let err = extract_json_value("The answer is clearly B.").unwrap_err();
        assert_eq!(err.reason, "no JSON object found");
    }

    #[test]
    fn test_bare_array_is_accepted_as_list() {
        let list = json_string_list(r#"["ent", "  oncology  ", ""]"#, &["selected"]).unwrap();
        assert_eq!(list, vec!["ent", "oncology"]);
    }

    #[test]
    fn test_missing_field_reports_names() {
        let err = json_string_list(r#"{"other": []}"#, &["selected", "selected_specialties"])
            .unwrap_err();
        assert!(err.reason.contains("selected | selected_specialties"));
    }

    #[test]
    fn test_parse_string_list_ignores_non_strings() {
        let value = json!(["a", 1, null, "/* x */", "b"]);
        assert_eq!(parse_string_list(&value), vec!["a", "b"]);
    }

    #[test]
    fn test_escaped_quotes_do_not_confuse_scanner() {
        let raw = r#"{"justification": "he said \"// not a comment\"", "final_answer": "D",}"#;
        let value = extract_json_value(raw).unwrap();
        assert_eq!(value["final_answer"], "D");
        assert_eq!(value["justification"], "he said \"// not a comment\"");
    }
}

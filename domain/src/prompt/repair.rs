//! Strengthened prompts for a stage's single retry

use super::template::PromptTemplate;

/// What went wrong with the previous attempt, and therefore what the
/// retry prompt has to insist on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairHint {
    /// No option letter could be read from the answer.
    AnswerMarker,
    /// JSON was expected but could not be parsed.
    StrictJson { reason: String },
    /// The output named ids outside the catalog.
    CatalogIds {
        invalid: Vec<String>,
        valid: Vec<String>,
    },
    /// The backend returned an empty or unusable payload.
    NonEmpty,
}

impl PromptTemplate {
    /// Append corrective instructions to the original stage prompt.
    ///
    /// The original prompt is kept whole: the backend has no memory of the
    /// failed attempt.
    pub fn strengthened(prompt: &str, hint: &RepairHint) -> String {
        let correction = match hint {
            RepairHint::AnswerMarker => r#"IMPORTANT: Your previous reply did not state a usable answer.
You MUST end your reply with exactly one line of the form:
ANSWER: X
where X is a single letter: A, B, C, or D."#
                .to_string(),
            RepairHint::StrictJson { reason } => format!(
                r#"IMPORTANT: Your previous reply was not valid JSON ({}).
Output ONLY one complete JSON object:
- no comments (no // or /* */)
- no text before or after the object
- no trailing commas
- keep it short enough to finish"#,
                reason
            ),
            RepairHint::CatalogIds { invalid, valid } => format!(
                r#"CRITICAL: Your previous reply used INVALID specialty ids: {}
These ids do NOT exist. Use ONLY ids from this list, copied exactly (lowercase, with underscores):
{}
Output ONLY valid JSON with no comments."#,
                invalid.join(", "),
                valid
                    .iter()
                    .map(|id| format!("  - {}", id))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
            RepairHint::NonEmpty => r#"IMPORTANT: Your previous reply was empty or unreadable.
Answer the task above in full."#
                .to_string(),
        };
        format!("{}\n\n{}", prompt, correction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strengthened_keeps_original_prompt() {
        let out = PromptTemplate::strengthened("ORIGINAL", &RepairHint::AnswerMarker);
        assert!(out.starts_with("ORIGINAL\n\n"));
        assert!(out.contains("ANSWER: X"));
    }

    #[test]
    fn test_catalog_hint_lists_valid_ids() {
        let hint = RepairHint::CatalogIds {
            invalid: vec!["heart_doctor".to_string()],
            valid: vec!["cardiology".to_string(), "neurology".to_string()],
        };
        let out = PromptTemplate::strengthened("P", &hint);
        assert!(out.contains("INVALID specialty ids: heart_doctor"));
        assert!(out.contains("  - cardiology\n  - neurology"));
    }

    #[test]
    fn test_json_hint_forbids_comments() {
        let hint = RepairHint::StrictJson {
            reason: "truncated JSON".to_string(),
        };
        let out = PromptTemplate::strengthened("P", &hint);
        assert!(out.contains("(truncated JSON)"));
        assert!(out.contains("no comments"));
    }
}

//! Domain error types

use thiserror::Error;

/// Raw text kept on parse errors is capped so checkpoints stay readable.
const MAX_RAW_CHARS: usize = 2_000;

/// The answer parser could not extract an option letter (or a structured
/// field) from model output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not parse answer: {reason}")]
pub struct AnswerParseError {
    /// Raw model output, kept for diagnostics.
    pub raw: String,
    pub reason: String,
}

impl AnswerParseError {
    pub fn new(raw: &str, reason: impl Into<String>) -> Self {
        Self {
            raw: super::string::truncate(raw, MAX_RAW_CHARS),
            reason: reason.into(),
        }
    }
}

/// Model output named values that are not members of the static catalog.
///
/// Distinct from [`AnswerParseError`]: the output parsed fine, but it
/// referenced ids that do not exist.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("values not in catalog: {}", invalid.join(", "))]
pub struct InvalidCatalogValueError {
    pub invalid: Vec<String>,
}

/// A dataset record that cannot be turned into a [`QuestionRecord`].
///
/// [`QuestionRecord`]: super::question::QuestionRecord
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedRecordError {
    #[error("record {index}: invalid JSON: {message}")]
    InvalidJson { index: usize, message: String },

    #[error("record {index}: question text is empty")]
    EmptyQuestion { index: usize },

    #[error("record {index}: expected 4 options, found {found}")]
    WrongOptionCount { index: usize, found: usize },

    #[error("record {index}: missing answer")]
    MissingAnswer { index: usize },

    #[error("record {index}: answer '{answer}' is not one of A-D")]
    InvalidAnswer { index: usize, answer: String },
}

impl MalformedRecordError {
    /// Zero-based position of the offending record in the source file.
    pub fn index(&self) -> usize {
        match self {
            Self::InvalidJson { index, .. }
            | Self::EmptyQuestion { index }
            | Self::WrongOptionCount { index, .. }
            | Self::MissingAnswer { index }
            | Self::InvalidAnswer { index, .. } => *index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_catalog_value_display() {
        let err = InvalidCatalogValueError {
            invalid: vec!["cardio".to_string(), "brain_doctor".to_string()],
        };
        assert_eq!(err.to_string(), "values not in catalog: cardio, brain_doctor");
    }

    #[test]
    fn test_answer_parse_error_caps_raw_text() {
        let raw = "x".repeat(10_000);
        let err = AnswerParseError::new(&raw, "no letter");
        assert!(err.raw.len() <= MAX_RAW_CHARS);
        assert_eq!(err.to_string(), "could not parse answer: no letter");
    }

    #[test]
    fn test_malformed_record_index() {
        let err = MalformedRecordError::WrongOptionCount { index: 7, found: 5 };
        assert_eq!(err.index(), 7);
        assert_eq!(err.to_string(), "record 7: expected 4 options, found 5");
    }
}

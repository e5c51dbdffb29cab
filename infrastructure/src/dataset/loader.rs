//! Reads MedQA items from a JSON array or JSONL file.
//!
//! Accepted record shapes:
//!
//! ```text
//! {"id": "q1", "question": "...", "options": ["A. ...", "B. ...", "C. ...", "D. ..."], "answer": "B"}
//! {"question": "...", "options": {"A": "...", "B": "...", "C": "...", "D": "..."}, "answer_idx": "B"}
//! ```
//!
//! Records that cannot be turned into a [`QuestionRecord`] are reported as
//! [`MalformedRecordError`]s and skipped; the rest of the file still loads.

use medqa_domain::{AnswerLetter, MalformedRecordError, QuestionRecord};
use regex::Regex;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{info, warn};

/// Matches a leading option letter such as `A. `, `(B) `, `C: ` or `D) `.
static OPTION_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\(?([A-Da-d])[\.\):]\s*").expect("valid option prefix regex")
});

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset {path} is not a JSON array: {message}")]
    InvalidArray { path: PathBuf, message: String },

    #[error("dataset {path} contains no usable records")]
    Empty { path: PathBuf },
}

/// Result of loading a dataset file.
#[derive(Debug, Default)]
pub struct LoadedDataset {
    pub questions: Vec<QuestionRecord>,
    pub skipped: Vec<MalformedRecordError>,
}

/// Load and validate every record in `path`.
pub fn load_dataset(path: &Path) -> Result<LoadedDataset, DatasetError> {
    let content = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let dataset = parse_dataset(&content).map_err(|message| DatasetError::InvalidArray {
        path: path.to_path_buf(),
        message,
    })?;

    for err in &dataset.skipped {
        warn!("Skipping malformed record: {}", err);
    }
    if dataset.questions.is_empty() {
        return Err(DatasetError::Empty {
            path: path.to_path_buf(),
        });
    }

    info!(
        "Loaded {} questions from {} ({} skipped)",
        dataset.questions.len(),
        path.display(),
        dataset.skipped.len()
    );
    Ok(dataset)
}

/// Parse dataset text. Fails only when the text looks like a JSON array
/// but does not parse as one; individual bad records are collected.
pub fn parse_dataset(content: &str) -> Result<LoadedDataset, String> {
    let trimmed = content.trim_start_matches('\u{feff}').trim();

    let records: Vec<Result<Value, MalformedRecordError>> = if trimmed.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(trimmed).map_err(|e| e.to_string())?;
        values.into_iter().map(Ok).collect()
    } else {
        trimmed
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|e| MalformedRecordError::InvalidJson {
                    index,
                    message: e.to_string(),
                })
            })
            .collect()
    };

    let mut dataset = LoadedDataset::default();
    for (index, record) in records.into_iter().enumerate() {
        match record.and_then(|value| parse_record(index, &value)) {
            Ok(question) => dataset.questions.push(question),
            Err(err) => dataset.skipped.push(err),
        }
    }
    Ok(dataset)
}

fn parse_record(index: usize, value: &Value) -> Result<QuestionRecord, MalformedRecordError> {
    let Some(object) = value.as_object() else {
        return Err(MalformedRecordError::InvalidJson {
            index,
            message: "record is not a JSON object".to_string(),
        });
    };

    let question = object
        .get("question")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    if question.is_empty() {
        return Err(MalformedRecordError::EmptyQuestion { index });
    }

    let options = parse_options(index, object.get("options"))?;
    let answer = parse_answer_field(index, object, &options)?;

    let id = match object.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("q{:05}", index),
    };

    Ok(QuestionRecord::new(id, question, options, answer))
}

fn parse_options(index: usize, value: Option<&Value>) -> Result<[String; 4], MalformedRecordError> {
    let texts: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| strip_prefix(item.as_str().unwrap_or_default()))
            .collect(),
        Some(Value::Object(map)) => {
            if map.len() != 4 {
                return Err(MalformedRecordError::WrongOptionCount {
                    index,
                    found: map.len(),
                });
            }
            AnswerLetter::ALL
                .iter()
                .filter_map(|letter| {
                    map.get(&letter.to_string())
                        .or_else(|| map.get(&letter.to_string().to_lowercase()))
                        .and_then(Value::as_str)
                        .map(|s| s.trim().to_string())
                })
                .collect()
        }
        _ => Vec::new(),
    };

    let found = texts.len();
    texts
        .try_into()
        .map_err(|_| MalformedRecordError::WrongOptionCount { index, found })
}

fn strip_prefix(option: &str) -> String {
    OPTION_PREFIX.replace(option, "").trim().to_string()
}

/// `answer_idx` wins over `answer`, since MedQA exports store the answer
/// text under `answer` and the letter under `answer_idx`.
fn parse_answer_field(
    index: usize,
    object: &Map<String, Value>,
    options: &[String; 4],
) -> Result<AnswerLetter, MalformedRecordError> {
    let raw = match object.get("answer_idx").or_else(|| object.get("answer")) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => {
            return n
                .as_u64()
                .and_then(|i| AnswerLetter::from_index(i as usize))
                .ok_or_else(|| MalformedRecordError::InvalidAnswer {
                    index,
                    answer: n.to_string(),
                });
        }
        _ => return Err(MalformedRecordError::MissingAnswer { index }),
    };

    if let Ok(letter) = raw.parse::<AnswerLetter>() {
        return Ok(letter);
    }
    // Full option text given instead of a letter.
    options
        .iter()
        .position(|opt| opt.eq_ignore_ascii_case(&raw))
        .and_then(AnswerLetter::from_index)
        .ok_or(MalformedRecordError::InvalidAnswer { index, answer: raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const JSONL: &str = r#"
{"question": "A 3-year-old boy has a barking cough and stridor.", "options": ["A. Epiglottitis", "B. Croup", "C. Asthma", "D. Foreign body aspiration"], "answer": "B"}
{"id": "custom-7", "question": "Cold intolerance and weight gain.", "options": {"A": "Hyperthyroidism", "B": "Hypothyroidism", "C": "Cushing syndrome", "D": "Addison disease"}, "answer": "Hypothyroidism", "answer_idx": "B"}
"#;

    #[test]
    fn test_parse_jsonl_with_both_option_shapes() {
        let dataset = parse_dataset(JSONL).unwrap();
        assert!(dataset.skipped.is_empty());
        assert_eq!(dataset.questions.len(), 2);

        let first = &dataset.questions[0];
        assert_eq!(first.id, "q00000");
        assert_eq!(first.options[1], "Croup");
        assert_eq!(first.correct_answer, AnswerLetter::B);

        let second = &dataset.questions[1];
        assert_eq!(second.id, "custom-7");
        assert_eq!(second.options[3], "Addison disease");
        assert_eq!(second.correct_answer, AnswerLetter::B);
    }

    #[test]
    fn test_parse_json_array() {
        let content = r#"[
            {"question": "Q1", "options": ["(A) one", "(B) two", "(C) three", "(D) four"], "answer": "d"},
            {"question": "Q2", "options": ["A: one", "B: two", "C: three", "D: four"], "answer": 0}
        ]"#;
        let dataset = parse_dataset(content).unwrap();
        assert_eq!(dataset.questions.len(), 2);
        assert_eq!(dataset.questions[0].options[0], "one");
        assert_eq!(dataset.questions[0].correct_answer, AnswerLetter::D);
        assert_eq!(dataset.questions[1].correct_answer, AnswerLetter::A);
        assert_eq!(dataset.questions[1].id, "q00001");
    }

    #[test]
    fn test_malformed_records_are_skipped_with_typed_errors() {
        let content = r#"
{"question": "ok", "options": ["A. a", "B. b", "C. c", "D. d"], "answer": "A"}
{"question": "five options", "options": ["A. a", "B. b", "C. c", "D. d", "E. e"], "answer": "A"}
{"question": "no answer", "options": ["A. a", "B. b", "C. c", "D. d"]}
{"question": "bad answer", "options": ["A. a", "B. b", "C. c", "D. d"], "answer": "E"}
{"question": "   ", "options": ["A. a", "B. b", "C. c", "D. d"], "answer": "A"}
not json at all
"#;
        let dataset = parse_dataset(content).unwrap();
        assert_eq!(dataset.questions.len(), 1);
        assert_eq!(dataset.skipped.len(), 5);
        assert_eq!(
            &dataset.skipped[..4],
            &[
                MalformedRecordError::WrongOptionCount { index: 1, found: 5 },
                MalformedRecordError::MissingAnswer { index: 2 },
                MalformedRecordError::InvalidAnswer {
                    index: 3,
                    answer: "E".to_string()
                },
                MalformedRecordError::EmptyQuestion { index: 4 },
            ]
        );
        assert!(matches!(
            dataset.skipped[4],
            MalformedRecordError::InvalidJson { index: 5, .. }
        ));
    }

    #[test]
    fn test_five_option_object_is_rejected() {
        let content = r#"{"question": "q", "options": {"A": "a", "B": "b", "C": "c", "D": "d", "E": "e"}, "answer_idx": "A"}"#;
        let dataset = parse_dataset(content).unwrap();
        assert_eq!(
            dataset.skipped,
            vec![MalformedRecordError::WrongOptionCount { index: 0, found: 5 }]
        );
    }

    #[test]
    fn test_broken_array_is_an_error() {
        assert!(parse_dataset("[{\"question\": ").is_err());
    }

    #[test]
    fn test_load_dataset_from_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".jsonl").unwrap();
        file.write_all(JSONL.as_bytes()).unwrap();

        let dataset = load_dataset(file.path()).unwrap();
        assert_eq!(dataset.questions.len(), 2);
    }

    #[test]
    fn test_load_dataset_all_malformed_is_empty_error() {
        let mut file = tempfile::NamedTempFile::with_suffix(".jsonl").unwrap();
        writeln!(file, r#"{{"question": "q", "options": [], "answer": "A"}}"#).unwrap();

        assert!(matches!(load_dataset(file.path()), Err(DatasetError::Empty { .. })));
    }

    #[test]
    fn test_load_dataset_missing_file() {
        let err = load_dataset(Path::new("/definitely/not/here.jsonl")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }
}

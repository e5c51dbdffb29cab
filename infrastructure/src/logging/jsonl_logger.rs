//! JSONL file writer for run events.
//!
//! Each [`RunEvent`] is serialized as a single JSON line with a
//! `type` field and `timestamp`, appended to the file via a buffered writer.

use medqa_application::{RunEvent, RunEventLogger};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL run-event logger that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlRunEventLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlRunEventLogger {
    /// Open `path` for appending, creating it and its parent directories.
    ///
    /// A resumed run keeps appending to the log of the interrupted one.
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create event log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(
                    "Could not create event log file {}: {}",
                    path.display(),
                    e
                );
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RunEventLogger for JsonlRunEventLogger {
    fn log(&self, event: RunEvent) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        // Build the record: merge payload with type + timestamp
        let record = if let serde_json::Value::Object(mut map) = event.payload {
            map.insert(
                "type".to_string(),
                serde_json::Value::String(event.event_type.to_string()),
            );
            map.insert(
                "timestamp".to_string(),
                serde_json::Value::String(timestamp),
            );
            serde_json::Value::Object(map)
        } else {
            serde_json::json!({
                "type": event.event_type,
                "timestamp": timestamp,
                "data": event.payload,
            })
        };

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            // Flushed per line so a killed run still leaves a readable log.
            let _ = writer.flush();
        }
    }
}

impl Drop for JsonlRunEventLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        let mut content = String::new();
        File::open(path).unwrap().read_to_string(&mut content).unwrap();
        content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_jsonl_logger_writes_one_record_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let logger = JsonlRunEventLogger::new(&path).unwrap();

        logger.log(RunEvent::new(
            "run_started",
            serde_json::json!({"strategy": "debate", "total": 10, "resumed_from": 0}),
        ));
        logger.log(RunEvent::new(
            "question_completed",
            serde_json::json!({"question_id": "q00000", "predicted": "B", "correct": true}),
        ));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        for record in &records {
            assert!(record.get("timestamp").is_some());
        }
        assert_eq!(records[0]["type"], "run_started");
        assert_eq!(records[0]["strategy"], "debate");
        assert_eq!(records[1]["type"], "question_completed");
        assert_eq!(records[1]["predicted"], "B");
    }

    #[test]
    fn test_jsonl_logger_wraps_non_object_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let logger = JsonlRunEventLogger::new(&path).unwrap();

        logger.log(RunEvent::new("checkpoint_saved", serde_json::json!(20)));
        drop(logger);

        let records = read_lines(&path);
        assert_eq!(records[0]["type"], "checkpoint_saved");
        assert_eq!(records[0]["data"], 20);
    }

    #[test]
    fn test_jsonl_logger_appends_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");

        let first = JsonlRunEventLogger::new(&path).unwrap();
        first.log(RunEvent::new("run_aborted", serde_json::json!({"completed": 3})));
        drop(first);

        let second = JsonlRunEventLogger::new(&path).unwrap();
        second.log(RunEvent::new("run_started", serde_json::json!({"resumed_from": 3})));
        drop(second);

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["type"], "run_aborted");
        assert_eq!(records[1]["resumed_from"], 3);
    }

    #[test]
    fn test_jsonl_logger_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs/debate-1/events.jsonl");
        let logger = JsonlRunEventLogger::new(&path).unwrap();
        assert_eq!(logger.path(), path.as_path());
        assert!(path.exists());
    }
}

//! Port for structured run-event logging.
//!
//! Defines the [`RunEventLogger`] trait for recording benchmark milestones
//! (run start, each finished question, checkpoints, completion) to a
//! machine-readable log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures one JSON record per
//! event for later analysis.

use serde_json::Value;

/// A structured run event.
///
/// Each event has a type string and a JSON payload; the adapter adds the
/// timestamp when it writes the record.
pub struct RunEvent {
    /// Event type identifier (e.g., "run_started", "question_completed").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl RunEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging run events.
///
/// `log` is synchronous and non-fallible; a logging failure must never
/// interrupt a benchmark run.
pub trait RunEventLogger: Send + Sync {
    fn log(&self, event: RunEvent);
}

/// No-op implementation for tests and when event logging is disabled.
pub struct NoEventLogger;

impl RunEventLogger for NoEventLogger {
    fn log(&self, _event: RunEvent) {}
}

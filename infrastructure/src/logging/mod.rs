//! Logging infrastructure: structured run-event logging.
//!
//! Provides [`JsonlRunEventLogger`], a JSONL file writer that implements
//! the [`RunEventLogger`](medqa_application::RunEventLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlRunEventLogger;

//! Presentation layer for medqa-bench
//!
//! This crate contains the CLI definition, progress reporters and the
//! console formatter for run summaries.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, OutputFormat};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::{ProgressReporter, SimpleProgress};

//! Progress notification port
//!
//! Defines the interface for reporting progress during a benchmark run.

use medqa_domain::{QuestionResult, RunSummary};

/// Callback for progress updates during a benchmark run
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (progress bar, plain log lines, etc.)
pub trait ProgressNotifier: Send + Sync {
    /// Called once before the first question. `already_done` is the number
    /// of questions restored from a checkpoint.
    fn on_run_start(&self, strategy: &str, total: usize, already_done: usize);

    /// Called after each question, whether it was answered or failed.
    fn on_question_complete(&self, index: usize, result: &QuestionResult);

    /// Called after a checkpoint has been written.
    fn on_checkpoint(&self, _completed: usize) {}

    /// Called when the loop ends (completed, aborted or interrupted).
    fn on_run_complete(&self, summary: &RunSummary);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_run_start(&self, _strategy: &str, _total: usize, _already_done: usize) {}
    fn on_question_complete(&self, _index: usize, _result: &QuestionResult) {}
    fn on_run_complete(&self, _summary: &RunSummary) {}
}

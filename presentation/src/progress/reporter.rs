//! Progress reporting for benchmark runs

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use medqa_application::ProgressNotifier;
use medqa_domain::{QuestionResult, RunSummary};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Short status marker for one finished question.
fn outcome_marker(result: &QuestionResult) -> String {
    match (&result.error, result.predicted_answer) {
        (Some(error), _) => format!("{} {} ({})", "!".yellow(), result.question_id, error.kind),
        (None, Some(answer)) if result.is_correct => {
            format!("{} {} {}", "v".green(), result.question_id, answer)
        }
        (None, Some(answer)) => format!(
            "{} {} {} (expected {})",
            "x".red(),
            result.question_id,
            answer,
            result.correct_answer
        ),
        (None, None) => format!("{} {}", "?".dimmed(), result.question_id),
    }
}

/// Reports progress with an indicatif bar and a running accuracy
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
    answered: AtomicUsize,
    correct: AtomicUsize,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            answered: AtomicUsize::new(0),
            correct: AtomicUsize::new(0),
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn running_accuracy(&self) -> String {
        let answered = self.answered.load(Ordering::Relaxed);
        if answered == 0 {
            return String::new();
        }
        let correct = self.correct.load(Ordering::Relaxed);
        format!("acc {:.1}%", 100.0 * correct as f64 / answered as f64)
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_run_start(&self, strategy: &str, total: usize, already_done: usize) {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(Self::bar_style());
        pb.set_prefix(strategy.to_string());
        pb.set_position(already_done as u64);
        if already_done > 0 {
            pb.set_message(format!("resumed after {}", already_done));
        } else {
            pb.set_message("Starting...");
        }

        if let Ok(mut bar) = self.bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_question_complete(&self, _index: usize, result: &QuestionResult) {
        if !result.is_failed() {
            self.answered.fetch_add(1, Ordering::Relaxed);
            if result.is_correct {
                self.correct.fetch_add(1, Ordering::Relaxed);
            }
        }

        if let Ok(bar) = self.bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            pb.set_message(format!("{}  {}", outcome_marker(result), self.running_accuracy()));
            pb.inc(1);
        }
    }

    fn on_checkpoint(&self, completed: usize) {
        if let Ok(bar) = self.bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            pb.println(format!("{} checkpoint saved ({} done)", "->".cyan(), completed));
        }
    }

    fn on_run_complete(&self, summary: &RunSummary) {
        if let Ok(mut bar) = self.bar.lock()
            && let Some(pb) = bar.take()
        {
            pb.finish_with_message(format!(
                "{} accuracy {:.1}%",
                "done".green(),
                summary.accuracy * 100.0
            ));
        }
    }
}

/// Line-per-question progress on stderr, for logs and non-terminal output
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_run_start(&self, strategy: &str, total: usize, already_done: usize) {
        eprintln!(
            "{} {} ({} questions, {} already done)",
            "->".cyan(),
            strategy.bold(),
            total,
            already_done
        );
    }

    fn on_question_complete(&self, index: usize, result: &QuestionResult) {
        eprintln!("  [{}] {}", index + 1, outcome_marker(result));
    }

    fn on_checkpoint(&self, completed: usize) {
        eprintln!("  {} checkpoint ({} done)", "->".cyan(), completed);
    }

    fn on_run_complete(&self, summary: &RunSummary) {
        eprintln!(
            "{} {} answered, {} failed",
            "->".cyan(),
            summary.attempted,
            summary.failed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medqa_domain::{AnswerLetter, QuestionError, QuestionErrorKind, QuestionRecord};

    fn question() -> QuestionRecord {
        QuestionRecord::new(
            "q00003",
            "Most likely diagnosis?",
            ["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()],
            AnswerLetter::B,
        )
    }

    #[test]
    fn test_outcome_marker_variants() {
        colored::control::set_override(false);

        let right = QuestionResult::answered(&question(), AnswerLetter::B, vec![]);
        assert_eq!(outcome_marker(&right), "v q00003 B");

        let wrong = QuestionResult::answered(&question(), AnswerLetter::D, vec![]);
        assert_eq!(outcome_marker(&wrong), "x q00003 D (expected B)");

        let failed = QuestionResult::failed(
            &question(),
            QuestionError::new(QuestionErrorKind::Timeout, "timed out twice"),
            vec![],
        );
        assert_eq!(outcome_marker(&failed), "! q00003 (timeout)");
    }

    #[test]
    fn test_running_accuracy_ignores_failed_questions() {
        let reporter = ProgressReporter::new();
        reporter.on_run_start("zero_shot", 3, 0);
        reporter.on_question_complete(0, &QuestionResult::answered(&question(), AnswerLetter::B, vec![]));
        reporter.on_question_complete(1, &QuestionResult::answered(&question(), AnswerLetter::A, vec![]));
        reporter.on_question_complete(
            2,
            &QuestionResult::failed(
                &question(),
                QuestionError::new(QuestionErrorKind::AnswerParse, "no letter"),
                vec![],
            ),
        );
        assert_eq!(reporter.running_accuracy(), "acc 50.0%");
    }
}

//! Run scoring
//!
//! [`score`] derives a [`RunSummary`] from a [`RunResult`]. Failed questions
//! are counted separately and never enter the accuracy denominator.

use crate::run::{QuestionErrorKind, RunResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate statistics for a run (derived, never edited by hand).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub strategy_name: String,
    /// Questions processed so far.
    pub total: usize,
    /// Questions that produced an answer.
    pub attempted: usize,
    pub correct: usize,
    pub failed: usize,
    /// `correct / attempted`
    pub accuracy: f64,
    /// `failed / total`
    pub error_rate: f64,
    pub total_tokens: u64,
    pub avg_tokens: f64,
    pub avg_latency_seconds: f64,
    pub avg_calls: f64,
    pub errors_by_kind: BTreeMap<QuestionErrorKind, usize>,
}

fn ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

/// Score a run. Pure and deterministic.
pub fn score(run: &RunResult) -> RunSummary {
    let results = &run.question_results;
    let total = results.len();
    let failed = results.iter().filter(|r| r.is_failed()).count();
    let attempted = total - failed;
    let correct = results
        .iter()
        .filter(|r| !r.is_failed() && r.is_correct)
        .count();

    let total_tokens: u64 = results.iter().map(|r| r.total_tokens).sum();
    let total_latency: f64 = results.iter().map(|r| r.total_latency_seconds).sum();
    let total_calls: usize = results.iter().map(|r| r.call_count()).sum();

    let mut errors_by_kind = BTreeMap::new();
    for error in results.iter().filter_map(|r| r.error.as_ref()) {
        *errors_by_kind.entry(error.kind).or_insert(0) += 1;
    }

    RunSummary {
        strategy_name: run.strategy_name.clone(),
        total,
        attempted,
        correct,
        failed,
        accuracy: ratio(correct as f64, attempted),
        error_rate: ratio(failed as f64, total),
        total_tokens,
        avg_tokens: ratio(total_tokens as f64, total),
        avg_latency_seconds: ratio(total_latency, total),
        avg_calls: ratio(total_calls as f64, total),
        errors_by_kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::question::{AnswerLetter, QuestionRecord};
    use crate::run::{CallTrace, QuestionError, QuestionResult};

    fn question(i: usize) -> QuestionRecord {
        QuestionRecord::new(
            format!("q{}", i),
            format!("Q{}", i),
            ["a".into(), "b".into(), "c".into(), "d".into()],
            AnswerLetter::A,
        )
    }

    #[test]
    fn test_failure_is_not_counted_as_wrong() {
        // 10 questions; question 3 fails to parse, 8 of the other 9 are right.
        let mut run = RunResult::new("zero_shot", serde_json::Value::Null);
        for i in 1..=10 {
            let q = question(i);
            let trace = CallTrace::success("ask", "p", 0.0, "r", 10, 1.0);
            let result = match i {
                3 => QuestionResult::failed(
                    &q,
                    QuestionError::new(QuestionErrorKind::AnswerParse, "no letter"),
                    vec![trace],
                ),
                7 => QuestionResult::answered(&q, AnswerLetter::C, vec![trace]),
                _ => QuestionResult::answered(&q, AnswerLetter::A, vec![trace]),
            };
            run.push(result);
        }

        let summary = score(&run);
        assert_eq!(summary.total, 10);
        assert_eq!(summary.attempted, 9);
        assert_eq!(summary.failed, 1);
        assert!((summary.error_rate - 0.1).abs() < 1e-12);
        assert!((summary.accuracy - 8.0 / 9.0).abs() < 1e-12);
        assert_eq!(summary.errors_by_kind[&QuestionErrorKind::AnswerParse], 1);
        assert_eq!(summary.avg_tokens, 10.0);
        assert_eq!(summary.avg_calls, 1.0);
    }

    #[test]
    fn test_empty_run() {
        let summary = score(&RunResult::new("debate", serde_json::Value::Null));
        assert_eq!(summary.total, 0);
        assert_eq!(summary.accuracy, 0.0);
        assert_eq!(summary.error_rate, 0.0);
    }

    #[test]
    fn test_all_failed_accuracy_is_zero_not_nan() {
        let mut run = RunResult::new("debate", serde_json::Value::Null);
        run.push(QuestionResult::failed(
            &question(1),
            QuestionError::new(QuestionErrorKind::Timeout, "timed out twice"),
            vec![],
        ));
        let summary = score(&run);
        assert_eq!(summary.accuracy, 0.0);
        assert_eq!(summary.error_rate, 1.0);
    }
}

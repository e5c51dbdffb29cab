//! Run Benchmark use case
//!
//! Iterates the dataset in order, answers each question with one strategy,
//! checkpoints every `checkpoint_interval` questions and supports resuming
//! from a previous checkpoint.

use crate::ports::checkpoint_store::{CheckpointError, CheckpointStore};
use crate::ports::llm_gateway::GatewayError;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::run_event_logger::{NoEventLogger, RunEvent, RunEventLogger};
use crate::strategies::{StrategyContext, answer_question, build_strategy};
use medqa_domain::{QuestionRecord, QuestionResult, RunResult, RunSummary, StrategyKind, score};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that stop a benchmark run
#[derive(Error, Debug)]
pub enum RunBenchmarkError {
    #[error("Backend unavailable: {0}")]
    Backend(GatewayError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error("Checkpoint does not match this run: {0}")]
    CheckpointMismatch(String),

    #[error("Run interrupted after {completed} questions")]
    Interrupted { completed: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Input for the RunBenchmark use case
#[derive(Debug, Clone)]
pub struct RunBenchmarkInput {
    pub strategy: StrategyKind,
    /// Questions in processing order.
    pub questions: Vec<QuestionRecord>,
    /// Continue from the stored checkpoint when one exists.
    pub resume: bool,
    /// Issue a warm-up generation before the first question.
    pub warm_up: bool,
}

impl RunBenchmarkInput {
    pub fn new(strategy: StrategyKind, questions: Vec<QuestionRecord>) -> Self {
        Self {
            strategy,
            questions,
            resume: false,
            warm_up: true,
        }
    }

    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn without_warm_up(mut self) -> Self {
        self.warm_up = false;
        self
    }
}

/// Final state of a completed run.
#[derive(Debug, Clone)]
pub struct RunBenchmarkOutput {
    pub run: RunResult,
    pub summary: RunSummary,
}

/// Use case for running one strategy over a dataset
pub struct RunBenchmarkUseCase {
    ctx: StrategyContext,
    checkpoint: Arc<dyn CheckpointStore>,
    events: Arc<dyn RunEventLogger>,
    cancel: CancellationToken,
}

impl RunBenchmarkUseCase {
    pub fn new(ctx: StrategyContext, checkpoint: Arc<dyn CheckpointStore>) -> Self {
        Self {
            ctx,
            checkpoint,
            events: Arc::new(NoEventLogger),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_event_logger(mut self, events: Arc<dyn RunEventLogger>) -> Self {
        self.events = events;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(&self, input: RunBenchmarkInput) -> Result<RunBenchmarkOutput, RunBenchmarkError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: RunBenchmarkInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<RunBenchmarkOutput, RunBenchmarkError> {
        let problems = self.ctx.config.validate();
        if !problems.is_empty() {
            return Err(RunBenchmarkError::InvalidConfig(problems.join("; ")));
        }

        let strategy = build_strategy(input.strategy);
        let mut run = self.prepare_run(&input).await?;
        let total = input.questions.len();
        let already_done = run.completed_count();

        info!(
            "Starting {} on {} questions ({} already done)",
            input.strategy, total, already_done
        );
        self.events.log(RunEvent::new(
            "run_started",
            json!({
                "strategy": input.strategy.as_str(),
                "total": total,
                "resumed_from": already_done,
                "backend": self.ctx.gateway.describe(),
                "model": self.ctx.config.model,
            }),
        ));
        progress.on_run_start(input.strategy.as_str(), total, already_done);

        if input.warm_up && already_done < total {
            self.warm_up().await?;
        }

        let interval = self.ctx.config.checkpoint_interval.max(1);
        for (index, question) in input.questions.iter().enumerate().skip(already_done) {
            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                result = answer_question(strategy.as_ref(), &self.ctx, question) => Some(result),
            };

            let result = match outcome {
                Some(Ok(result)) => result,
                Some(Err(err)) => {
                    warn!("Backend failure on question {}: {}", question.id, err);
                    self.abort(&run, progress, "backend_unavailable").await?;
                    return Err(RunBenchmarkError::Backend(err));
                }
                None => {
                    info!("Run cancelled before question {}", question.id);
                    self.abort(&run, progress, "interrupted").await?;
                    return Err(RunBenchmarkError::Interrupted {
                        completed: run.completed_count(),
                    });
                }
            };

            self.log_question(index, &result);
            progress.on_question_complete(index, &result);
            run.push(result);

            let completed = run.completed_count();
            if completed % interval == 0 && completed < total {
                self.save(&run).await?;
                progress.on_checkpoint(completed);
            }
        }

        run.mark_completed();
        let summary = self.save(&run).await?;
        progress.on_checkpoint(run.completed_count());
        self.events.log(RunEvent::new(
            "run_completed",
            serde_json::to_value(&summary).unwrap_or_default(),
        ));
        progress.on_run_complete(&summary);
        info!(
            "Run complete: accuracy {:.3} over {} attempted, {} failed",
            summary.accuracy, summary.attempted, summary.failed
        );

        Ok(RunBenchmarkOutput { run, summary })
    }

    /// Load and validate the checkpoint, or start a fresh run.
    async fn prepare_run(&self, input: &RunBenchmarkInput) -> Result<RunResult, RunBenchmarkError> {
        if input.resume {
            match self.checkpoint.load().await? {
                Some(mut run) => {
                    validate_resume(&run, input)?;
                    run.reopen();
                    info!("Resuming from checkpoint with {} results", run.completed_count());
                    return Ok(run);
                }
                None => info!("No checkpoint found, starting a new run"),
            }
        }

        let snapshot = json!({
            "strategy": input.strategy.as_str(),
            "backend": self.ctx.gateway.describe(),
            "config": serde_json::to_value(self.ctx.config.as_ref()).unwrap_or_default(),
        });
        Ok(RunResult::new(input.strategy.as_str(), snapshot))
    }

    async fn warm_up(&self) -> Result<(), RunBenchmarkError> {
        debug!("Warming up backend");
        match self.ctx.gateway.warm_up(self.ctx.config.call_timeout()).await {
            Ok(()) => Ok(()),
            Err(err @ GatewayError::BackendUnavailable(_)) => Err(RunBenchmarkError::Backend(err)),
            Err(err) => {
                warn!("Warm-up failed, continuing: {}", err);
                Ok(())
            }
        }
    }

    async fn save(&self, run: &RunResult) -> Result<RunSummary, RunBenchmarkError> {
        let summary = score(run);
        self.checkpoint.save(run, &summary).await?;
        debug!("Checkpoint saved at {} questions", run.completed_count());
        self.events.log(RunEvent::new(
            "checkpoint_saved",
            json!({ "completed": run.completed_count() }),
        ));
        Ok(summary)
    }

    /// Persist what was finished before stopping early.
    async fn abort(
        &self,
        run: &RunResult,
        progress: &dyn ProgressNotifier,
        reason: &str,
    ) -> Result<(), RunBenchmarkError> {
        let summary = self.save(run).await?;
        progress.on_checkpoint(run.completed_count());
        self.events.log(RunEvent::new(
            "run_aborted",
            json!({ "reason": reason, "completed": run.completed_count() }),
        ));
        progress.on_run_complete(&summary);
        Ok(())
    }

    fn log_question(&self, index: usize, result: &QuestionResult) {
        self.events.log(RunEvent::new(
            "question_completed",
            json!({
                "index": index,
                "question_id": result.question_id,
                "predicted_answer": result.predicted_answer,
                "correct_answer": result.correct_answer,
                "is_correct": result.is_correct,
                "error": result.error.as_ref().map(|e| e.kind.as_str()),
                "calls": result.call_count(),
                "tokens": result.total_tokens,
                "latency_seconds": result.total_latency_seconds,
            }),
        ));
    }
}

/// A checkpoint may only continue the same strategy over the same dataset
/// prefix.
fn validate_resume(run: &RunResult, input: &RunBenchmarkInput) -> Result<(), RunBenchmarkError> {
    if run.strategy_name != input.strategy.as_str() {
        return Err(RunBenchmarkError::CheckpointMismatch(format!(
            "checkpoint strategy is '{}', requested '{}'",
            run.strategy_name, input.strategy
        )));
    }
    if run.completed_count() > input.questions.len() {
        return Err(RunBenchmarkError::CheckpointMismatch(format!(
            "checkpoint holds {} results but the dataset has {} questions",
            run.completed_count(),
            input.questions.len()
        )));
    }
    for (index, (stored, question)) in run.question_ids().zip(&input.questions).enumerate() {
        if stored != question.id {
            return Err(RunBenchmarkError::CheckpointMismatch(format!(
                "question {} is '{}' in the checkpoint but '{}' in the dataset",
                index, stored, question.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::strategies::testing::{ScriptedGateway, context};
    use async_trait::async_trait;
    use medqa_domain::AnswerLetter;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryCheckpoint {
        stored: Mutex<Option<RunResult>>,
        saves: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl CheckpointStore for MemoryCheckpoint {
        async fn load(&self) -> Result<Option<RunResult>, CheckpointError> {
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn save(&self, run: &RunResult, _summary: &RunSummary) -> Result<(), CheckpointError> {
            *self.stored.lock().unwrap() = Some(run.clone());
            self.saves.lock().unwrap().push(run.completed_count());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingEvents(Mutex<Vec<&'static str>>);

    impl RunEventLogger for RecordingEvents {
        fn log(&self, event: RunEvent) {
            self.0.lock().unwrap().push(event.event_type);
        }
    }

    fn questions(n: usize) -> Vec<QuestionRecord> {
        (0..n)
            .map(|i| {
                let answer = AnswerLetter::from_index(i % 4).unwrap();
                QuestionRecord::new(
                    format!("q{i:05}"),
                    format!("Question number {i}?"),
                    ["w".into(), "x".into(), "y".into(), "z".into()],
                    answer,
                )
            })
            .collect()
    }

    /// Answers every question correctly by reading its number.
    fn oracle() -> ScriptedGateway {
        ScriptedGateway::with_responder(Vec::new(), |request| {
            let n: usize = request
                .prompt
                .split("Question number ")
                .nth(1)
                .and_then(|rest| rest.split('?').next())
                .and_then(|num| num.parse().ok())
                .unwrap_or(0);
            let letter = AnswerLetter::from_index(n % 4).unwrap_or(AnswerLetter::A);
            Ok(format!("Reasoning...\nANSWER: {letter}"))
        })
    }

    fn use_case(gateway: Arc<ScriptedGateway>, store: Arc<MemoryCheckpoint>, config: RunConfig) -> RunBenchmarkUseCase {
        RunBenchmarkUseCase::new(context(gateway, config), store)
    }

    #[tokio::test]
    async fn test_zero_shot_end_to_end() {
        let gateway = Arc::new(ScriptedGateway::repeating("Reasoning...\nANSWER: B"));
        let store = Arc::new(MemoryCheckpoint::default());
        let question = QuestionRecord::new(
            "q00000",
            "Which?",
            ["a".into(), "b".into(), "c".into(), "d".into()],
            AnswerLetter::B,
        );

        let output = use_case(gateway, store.clone(), RunConfig::default())
            .execute(RunBenchmarkInput::new(StrategyKind::ZeroShot, vec![question]))
            .await
            .unwrap();
        assert_eq!(output.summary.accuracy, 1.0);
        assert!(output.run.is_completed());
        assert!(store.stored.lock().unwrap().as_ref().unwrap().is_completed());
    }

    #[tokio::test]
    async fn test_checkpoint_interval() {
        let store = Arc::new(MemoryCheckpoint::default());
        let config = RunConfig::default().with_checkpoint_interval(2);
        let events = Arc::new(RecordingEvents::default());

        use_case(Arc::new(oracle()), store.clone(), config)
            .with_event_logger(events.clone())
            .execute(RunBenchmarkInput::new(StrategyKind::ZeroShot, questions(5)))
            .await
            .unwrap();
        assert_eq!(*store.saves.lock().unwrap(), [2, 4, 5]);

        let events = events.0.lock().unwrap();
        assert_eq!(events.first(), Some(&"run_started"));
        assert_eq!(events.last(), Some(&"run_completed"));
        assert_eq!(events.iter().filter(|e| **e == "question_completed").count(), 5);
    }

    #[tokio::test]
    async fn test_resume_matches_uninterrupted_run() {
        let qs = questions(6);

        let full_store = Arc::new(MemoryCheckpoint::default());
        let full = use_case(Arc::new(oracle()), full_store, RunConfig::default())
            .execute(RunBenchmarkInput::new(StrategyKind::ZeroShot, qs.clone()))
            .await
            .unwrap();

        let store = Arc::new(MemoryCheckpoint::default());
        let first = use_case(Arc::new(oracle()), store.clone(), RunConfig::default())
            .execute(RunBenchmarkInput::new(StrategyKind::ZeroShot, qs[..3].to_vec()))
            .await
            .unwrap();
        assert_eq!(first.run.completed_count(), 3);

        let gateway = Arc::new(oracle());
        let resumed = use_case(gateway.clone(), store, RunConfig::default())
            .execute(RunBenchmarkInput::new(StrategyKind::ZeroShot, qs).with_resume(true).without_warm_up())
            .await
            .unwrap();
        assert_eq!(gateway.call_count(), 3);

        let predicted = |run: &RunResult| -> Vec<_> {
            run.question_results
                .iter()
                .map(|r| (r.question_id.clone(), r.predicted_answer))
                .collect()
        };
        assert_eq!(predicted(&resumed.run), predicted(&full.run));
        assert_eq!(resumed.summary.accuracy, full.summary.accuracy);
    }

    #[tokio::test]
    async fn test_resume_rejects_other_strategy() {
        let store = Arc::new(MemoryCheckpoint::default());
        use_case(Arc::new(oracle()), store.clone(), RunConfig::default())
            .execute(RunBenchmarkInput::new(StrategyKind::ZeroShot, questions(2)))
            .await
            .unwrap();

        let err = use_case(Arc::new(oracle()), store, RunConfig::default())
            .execute(RunBenchmarkInput::new(StrategyKind::ChainOfThought, questions(4)).with_resume(true))
            .await
            .unwrap_err();
        assert!(matches!(err, RunBenchmarkError::CheckpointMismatch(_)));
    }

    #[tokio::test]
    async fn test_resume_rejects_reordered_dataset() {
        let store = Arc::new(MemoryCheckpoint::default());
        use_case(Arc::new(oracle()), store.clone(), RunConfig::default())
            .execute(RunBenchmarkInput::new(StrategyKind::ZeroShot, questions(2)))
            .await
            .unwrap();

        let mut reordered = questions(4);
        reordered.swap(0, 1);
        let err = use_case(Arc::new(oracle()), store, RunConfig::default())
            .execute(RunBenchmarkInput::new(StrategyKind::ZeroShot, reordered).with_resume(true))
            .await
            .unwrap_err();
        assert!(matches!(err, RunBenchmarkError::CheckpointMismatch(_)));
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_checkpoint() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Ok("ANSWER: A".to_string()),
            Ok("ANSWER: B".to_string()),
            Err(GatewayError::BackendUnavailable("connection refused".into())),
        ]));
        let store = Arc::new(MemoryCheckpoint::default());

        let err = use_case(gateway, store.clone(), RunConfig::default())
            .execute(RunBenchmarkInput::new(StrategyKind::ZeroShot, questions(4)).without_warm_up())
            .await
            .unwrap_err();
        assert!(matches!(err, RunBenchmarkError::Backend(_)));

        let stored = store.stored.lock().unwrap().clone().unwrap();
        assert_eq!(stored.completed_count(), 2);
        assert!(!stored.is_completed());
    }

    #[tokio::test]
    async fn test_warm_up_unavailable_is_fatal() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Err(GatewayError::BackendUnavailable(
            "no server".into(),
        ))]));
        let err = use_case(gateway.clone(), Arc::new(MemoryCheckpoint::default()), RunConfig::default())
            .execute(RunBenchmarkInput::new(StrategyKind::ZeroShot, questions(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, RunBenchmarkError::Backend(_)));
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_warm_up_other_failure_is_ignored() {
        let gateway = Arc::new(ScriptedGateway::with_responder(
            vec![Err(GatewayError::MalformedResponse("warming".into()))],
            |_| Ok("ANSWER: A".to_string()),
        ));
        let output = use_case(gateway, Arc::new(MemoryCheckpoint::default()), RunConfig::default())
            .execute(RunBenchmarkInput::new(StrategyKind::ZeroShot, questions(1)))
            .await
            .unwrap();
        assert_eq!(output.summary.correct, 1);
    }

    #[tokio::test]
    async fn test_cancelled_run_flushes_checkpoint() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let store = Arc::new(MemoryCheckpoint::default());

        let err = use_case(Arc::new(oracle()), store.clone(), RunConfig::default())
            .with_cancellation(cancel)
            .execute(RunBenchmarkInput::new(StrategyKind::ZeroShot, questions(3)).without_warm_up())
            .await
            .unwrap_err();
        assert!(matches!(err, RunBenchmarkError::Interrupted { completed: 0 }));
        assert!(store.stored.lock().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_zero_temperature_runs_are_deterministic() {
        let config = RunConfig::default()
            .with_temperature(0.0)
            .with_exploration_temperature(0.0);
        let mut outcomes = Vec::new();
        for _ in 0..2 {
            let output = use_case(Arc::new(oracle()), Arc::new(MemoryCheckpoint::default()), config.clone())
                .execute(RunBenchmarkInput::new(StrategyKind::Debate, questions(3)).without_warm_up())
                .await
                .unwrap();
            let answers: Vec<_> = output
                .run
                .question_results
                .iter()
                .map(|r| r.predicted_answer)
                .collect();
            outcomes.push(answers);
        }
        assert_eq!(outcomes[0], outcomes[1]);
    }

    #[tokio::test]
    async fn test_failed_questions_excluded_from_accuracy() {
        let gateway = Arc::new(ScriptedGateway::texts(&[
            "warm",
            "ANSWER: A",
            "no letter",
            "still no letter",
            "ANSWER: D",
        ]));
        let mut qs = questions(3);
        qs[2].correct_answer = AnswerLetter::D;

        let output = use_case(gateway, Arc::new(MemoryCheckpoint::default()), RunConfig::default())
            .execute(RunBenchmarkInput::new(StrategyKind::ZeroShot, qs))
            .await
            .unwrap();
        assert_eq!(output.summary.failed, 1);
        assert_eq!(output.summary.attempted, 2);
        assert_eq!(output.summary.accuracy, 1.0);
    }
}

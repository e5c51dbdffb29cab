//! Stage execution: one prompt, its retries, and the traces they leave.
//!
//! A [`StageRunner`] is created per question. It owns the question's trace
//! list and its wall-clock deadline, and it is the only code that turns
//! gateway outcomes into [`CallTrace`]s.
//!
//! Retry policy per stage:
//!
//! | Failure                  | Handling                                      |
//! |--------------------------|-----------------------------------------------|
//! | timeout                  | repeated once by the gateway client           |
//! | backend unavailable      | fatal, the run stops                          |
//! | malformed response       | strengthened prompt, up to `max_retries`      |
//! | unparseable output       | strengthened prompt, up to `max_retries`      |
//! | question budget exceeded | question fails immediately                    |

use super::context::StrategyContext;
use crate::ports::llm_gateway::{CompletionRequest, GatewayError};
use futures::future::join_all;
use medqa_domain::{
    AnswerLetter, AnswerParseError, CallTrace, InvalidCatalogValueError, PromptTemplate,
    QuestionError, QuestionErrorKind, RepairHint, parse_answer,
};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

/// One prompt to send.
#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub name: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Stage {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            temperature,
            max_tokens,
        }
    }
}

/// Output rejected by a stage parser; the stage may be retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoverableError {
    pub kind: QuestionErrorKind,
    pub message: String,
    pub hint: RepairHint,
}

impl RecoverableError {
    pub fn new(kind: QuestionErrorKind, message: impl Into<String>, hint: RepairHint) -> Self {
        Self {
            kind,
            message: message.into(),
            hint,
        }
    }

    /// A missing option letter.
    pub fn answer(err: AnswerParseError) -> Self {
        Self::new(QuestionErrorKind::AnswerParse, err.to_string(), RepairHint::AnswerMarker)
    }

    /// Broken or incomplete JSON.
    pub fn json(err: AnswerParseError) -> Self {
        let hint = RepairHint::StrictJson {
            reason: err.reason.clone(),
        };
        Self::new(QuestionErrorKind::AnswerParse, err.to_string(), hint)
    }

    /// Ids outside the specialty catalog.
    pub fn catalog(err: InvalidCatalogValueError, valid: Vec<String>) -> Self {
        let message = err.to_string();
        let hint = RepairHint::CatalogIds {
            invalid: err.invalid,
            valid,
        };
        Self::new(QuestionErrorKind::InvalidCatalogValue, message, hint)
    }

    fn malformed(err: &GatewayError) -> Self {
        Self::new(QuestionErrorKind::MalformedResponse, err.to_string(), RepairHint::NonEmpty)
    }
}

/// Why a stage produced no value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    /// The backend is gone. The run must stop.
    #[error("{0}")]
    Fatal(GatewayError),

    /// The question fails; the run continues.
    #[error("{}: {}", .0.kind, .0.message)]
    Aborted(QuestionError),

    /// Retries exhausted on output the caller may still salvage.
    #[error("{}", .0.message)]
    Exhausted(RecoverableError),
}

impl StageError {
    /// Collapse into a question failure.
    pub fn into_question_error(self) -> Result<QuestionError, GatewayError> {
        match self {
            StageError::Fatal(err) => Err(err),
            StageError::Aborted(err) => Ok(err),
            StageError::Exhausted(err) => Ok(QuestionError::new(err.kind, err.message)),
        }
    }
}

/// Runs stages for one question and collects their traces.
pub struct StageRunner<'a> {
    ctx: &'a StrategyContext,
    deadline: Instant,
    budget: Duration,
    traces: Vec<CallTrace>,
}

impl<'a> StageRunner<'a> {
    pub fn new(ctx: &'a StrategyContext, budget: Duration) -> Self {
        Self {
            ctx,
            deadline: Instant::now() + budget,
            budget,
            traces: Vec::new(),
        }
    }

    pub fn context(&self) -> &'a StrategyContext {
        self.ctx
    }

    pub fn traces(&self) -> &[CallTrace] {
        &self.traces
    }

    pub fn into_traces(self) -> Vec<CallTrace> {
        self.traces
    }

    /// Run a stage whose reply must not be empty.
    pub async fn run_text(&mut self, stage: Stage) -> Result<String, StageError> {
        self.run_parsed(stage, non_empty).await
    }

    /// Run a stage whose reply must name an option.
    pub async fn run_answer(&mut self, stage: Stage) -> Result<AnswerLetter, StageError> {
        self.run_parsed(stage, |raw| parse_answer(raw).map_err(RecoverableError::answer))
            .await
    }

    /// Run a stage and parse its reply, retrying with a strengthened prompt
    /// while the parser rejects it.
    pub async fn run_parsed<T, F>(&mut self, stage: Stage, parse: F) -> Result<T, StageError>
    where
        F: Fn(&str) -> Result<T, RecoverableError> + Sync,
    {
        let (traces, result) = execute(self.ctx, self.deadline, self.budget, &stage, &parse).await;
        self.traces.extend(traces);
        result
    }

    /// Run stages that do not depend on each other. `parse` receives the
    /// stage index along with the reply.
    ///
    /// With `concurrent_stages` enabled the calls are issued together.
    /// Traces are always appended in stage order. A fatal error from any
    /// stage wins; otherwise the first failing stage decides the error.
    pub async fn run_independent<T, F>(&mut self, stages: Vec<Stage>, parse: F) -> Result<Vec<T>, StageError>
    where
        F: Fn(usize, &str) -> Result<T, RecoverableError> + Sync,
    {
        let mut values = Vec::with_capacity(stages.len());

        if self.ctx.config.concurrent_stages {
            let (ctx, deadline, budget) = (self.ctx, self.deadline, self.budget);
            let parse = &parse;
            let outcomes = join_all(stages.iter().enumerate().map(|(index, stage)| async move {
                let parse_one = move |raw: &str| parse(index, raw);
                execute(ctx, deadline, budget, stage, &parse_one).await
            }))
            .await;

            let mut errors = Vec::new();
            for (traces, result) in outcomes {
                self.traces.extend(traces);
                match result {
                    Ok(value) => values.push(value),
                    Err(err) => errors.push(err),
                }
            }
            return match pick_error(errors) {
                Some(err) => Err(err),
                None => Ok(values),
            };
        }

        for (index, stage) in stages.into_iter().enumerate() {
            let value = self.run_parsed(stage, |raw| parse(index, raw)).await?;
            values.push(value);
        }
        Ok(values)
    }
}

/// Accept any reply with visible text.
pub fn non_empty(raw: &str) -> Result<String, RecoverableError> {
    if raw.trim().is_empty() {
        return Err(RecoverableError::new(
            QuestionErrorKind::MalformedResponse,
            "empty response",
            RepairHint::NonEmpty,
        ));
    }
    Ok(raw.to_string())
}

async fn execute<T, F>(
    ctx: &StrategyContext,
    deadline: Instant,
    budget: Duration,
    stage: &Stage,
    parse: &F,
) -> (Vec<CallTrace>, Result<T, StageError>)
where
    F: Fn(&str) -> Result<T, RecoverableError> + Sync,
{
    let mut traces = Vec::new();
    let mut prompt = stage.prompt.clone();
    let mut attempt = 0;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return (traces, Err(budget_exceeded(budget)));
        }

        let request = CompletionRequest::new(
            prompt.clone(),
            stage.temperature,
            stage.max_tokens,
            ctx.config.call_timeout(),
        );
        debug!("Stage {} attempt {}", stage.name, attempt + 1);

        let call = match tokio::time::timeout_at(deadline, ctx.gateway.generate(&request)).await {
            Ok(call) => call,
            Err(_) => {
                traces.push(CallTrace::failure(
                    &stage.name,
                    &prompt,
                    stage.temperature,
                    remaining.as_secs_f64(),
                    "question budget exceeded",
                ));
                return (traces, Err(budget_exceeded(budget)));
            }
        };

        for failed in &call.retried {
            traces.push(CallTrace::failure(
                &stage.name,
                &prompt,
                stage.temperature,
                failed.latency_seconds,
                failed.error.to_string(),
            ));
        }

        let rejection = match call.result {
            Ok(completion) => {
                let trace = CallTrace::success(
                    &stage.name,
                    &prompt,
                    stage.temperature,
                    &completion.text,
                    completion.token_count,
                    call.latency_seconds,
                );
                match parse(&completion.text) {
                    Ok(value) => {
                        traces.push(trace);
                        return (traces, Ok(value));
                    }
                    Err(rejection) => {
                        traces.push(trace.with_error(&rejection.message));
                        rejection
                    }
                }
            }
            Err(err) => {
                traces.push(CallTrace::failure(
                    &stage.name,
                    &prompt,
                    stage.temperature,
                    call.latency_seconds,
                    err.to_string(),
                ));
                match err {
                    GatewayError::BackendUnavailable(_) => return (traces, Err(StageError::Fatal(err))),
                    GatewayError::Timeout(_) => {
                        let error = QuestionError::new(QuestionErrorKind::Timeout, err.to_string());
                        return (traces, Err(StageError::Aborted(error)));
                    }
                    GatewayError::MalformedResponse(_) => RecoverableError::malformed(&err),
                }
            }
        };

        if attempt >= ctx.config.max_retries {
            warn!("Stage {} failed after {} attempts: {}", stage.name, attempt + 1, rejection.message);
            return (traces, Err(StageError::Exhausted(rejection)));
        }
        attempt += 1;
        prompt = PromptTemplate::strengthened(&stage.prompt, &rejection.hint);
    }
}

fn pick_error(errors: Vec<StageError>) -> Option<StageError> {
    let fatal = errors.iter().position(|err| matches!(err, StageError::Fatal(_)));
    let mut errors = errors.into_iter();
    match fatal {
        Some(index) => errors.nth(index),
        None => errors.next(),
    }
}

fn budget_exceeded(budget: Duration) -> StageError {
    StageError::Aborted(QuestionError::new(
        QuestionErrorKind::QuestionBudgetExceeded,
        format!("question budget of {}s exceeded", budget.as_secs()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::ports::llm_gateway::{Completion, LlmGateway};
    use crate::strategies::testing::{ScriptedGateway, context};
    use async_trait::async_trait;
    use std::sync::Arc;

    fn stage() -> Stage {
        Stage::new("ask", "PROMPT", 0.0, 64)
    }

    #[tokio::test]
    async fn test_malformed_response_gets_strengthened_retry() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Err(GatewayError::MalformedResponse("status 500".into())),
            Ok("ANSWER: B".to_string()),
        ]));
        let ctx = context(gateway.clone(), RunConfig::default());
        let mut runner = StageRunner::new(&ctx, Duration::from_secs(60));

        let answer = runner.run_answer(stage()).await.unwrap();
        assert_eq!(answer, AnswerLetter::B);
        assert_eq!(runner.traces().len(), 2);
        assert!(runner.traces()[0].is_error());
        assert!(gateway.requests()[1].prompt.contains("empty or unreadable"));
    }

    #[tokio::test]
    async fn test_backend_unavailable_is_fatal() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Err(GatewayError::BackendUnavailable(
            "connection refused".into(),
        ))]));
        let ctx = context(gateway.clone(), RunConfig::default());
        let mut runner = StageRunner::new(&ctx, Duration::from_secs(60));

        let err = runner.run_answer(stage()).await.unwrap_err();
        assert!(matches!(err, StageError::Fatal(GatewayError::BackendUnavailable(_))));
        assert_eq!(gateway.call_count(), 1);
        assert!(err.into_question_error().is_err());
    }

    #[tokio::test]
    async fn test_double_timeout_aborts_question() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Err(GatewayError::Timeout(Duration::from_secs(30))),
            Err(GatewayError::Timeout(Duration::from_secs(30))),
        ]));
        let ctx = context(gateway.clone(), RunConfig::default());
        let mut runner = StageRunner::new(&ctx, Duration::from_secs(60));

        let err = runner.run_text(stage()).await.unwrap_err();
        let error = err.into_question_error().unwrap();
        assert_eq!(error.kind, QuestionErrorKind::Timeout);
        assert_eq!(runner.traces().len(), 2);
    }

    #[tokio::test]
    async fn test_retries_bounded_by_config() {
        let gateway = Arc::new(ScriptedGateway::texts(&["x", "y", "z", "ANSWER: A"]));
        let ctx = context(gateway.clone(), RunConfig::default().with_max_retries(2));
        let mut runner = StageRunner::new(&ctx, Duration::from_secs(60));

        let err = runner.run_answer(stage()).await.unwrap_err();
        assert!(matches!(err, StageError::Exhausted(_)));
        assert_eq!(gateway.call_count(), 3);
    }

    struct NeverGateway;

    #[async_trait]
    impl LlmGateway for NeverGateway {
        async fn generate(&self, _request: &CompletionRequest) -> Result<Completion, GatewayError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_question_budget_exceeded() {
        let ctx = StrategyContext::new(
            crate::gateway::GatewayClient::new(Arc::new(NeverGateway)),
            Arc::new(medqa_domain::SpecialtyCatalog::standard()),
            Arc::new(RunConfig::default().with_timeout_seconds(30)),
        );
        let mut runner = StageRunner::new(&ctx, Duration::from_secs(10));

        let err = runner.run_text(stage()).await.unwrap_err();
        let error = err.into_question_error().unwrap();
        assert_eq!(error.kind, QuestionErrorKind::QuestionBudgetExceeded);
        assert_eq!(runner.traces().len(), 1);
        assert_eq!(runner.traces()[0].error.as_deref(), Some("question budget exceeded"));
    }

    #[tokio::test]
    async fn test_independent_stages_sequential_stop_at_first_failure() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Ok("one".to_string()),
            Err(GatewayError::BackendUnavailable("gone".into())),
            Ok("three".to_string()),
        ]));
        let ctx = context(gateway.clone(), RunConfig::default());
        let mut runner = StageRunner::new(&ctx, Duration::from_secs(60));

        let stages = (0..3).map(|i| Stage::new(format!("s{i}"), "P", 1.0, 64)).collect();
        let err = runner
            .run_independent(stages, |_, raw| non_empty(raw))
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Fatal(_)));
        assert_eq!(gateway.call_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_stages_surface_backend_failure_from_later_stage() {
        let gateway = Arc::new(ScriptedGateway::with_responder(Vec::new(), |request| {
            if request.prompt.contains("SECOND") {
                Err(GatewayError::BackendUnavailable("gone".into()))
            } else {
                Ok("   ".to_string())
            }
        }));
        let config = RunConfig::default().with_concurrent_stages(true).with_max_retries(1);
        let ctx = context(gateway.clone(), config);
        let mut runner = StageRunner::new(&ctx, Duration::from_secs(60));

        let stages = vec![
            Stage::new("s0", "FIRST", 0.0, 64),
            Stage::new("s1", "SECOND", 0.0, 64),
        ];
        let err = runner
            .run_independent(stages, |_, raw| non_empty(raw))
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Fatal(GatewayError::BackendUnavailable(_))));
        assert!(err.into_question_error().is_err());

        let names: Vec<&str> = runner.traces().iter().map(|t| t.stage_name.as_str()).collect();
        assert_eq!(names, ["s0", "s0", "s1"]);
    }

    #[tokio::test]
    async fn test_concurrent_stages_first_failure_in_stage_order() {
        let gateway = Arc::new(ScriptedGateway::with_responder(Vec::new(), |request| {
            if request.prompt.contains("SECOND") {
                Err(GatewayError::Timeout(Duration::from_secs(30)))
            } else {
                Ok("   ".to_string())
            }
        }));
        let config = RunConfig::default().with_concurrent_stages(true).with_max_retries(0);
        let ctx = context(gateway.clone(), config);
        let mut runner = StageRunner::new(&ctx, Duration::from_secs(60));

        let stages = vec![
            Stage::new("s0", "FIRST", 0.0, 64),
            Stage::new("s1", "SECOND", 0.0, 64),
        ];
        let err = runner
            .run_independent(stages, |_, raw| non_empty(raw))
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Exhausted(_)));
    }
}

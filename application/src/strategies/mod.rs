//! Reasoning strategies.
//!
//! Every strategy implements [`Strategy::decide`] as a sequence of stages
//! run through a [`StageRunner`]. [`answer_question`] wraps a strategy with
//! the question budget and turns its outcome into a [`QuestionResult`].
//!
//! | Strategy                           | Module               |
//! |------------------------------------|----------------------|
//! | zero_shot, zero_shot_physician     | [`zero_shot`]        |
//! | single_shot_cot                    | [`chain_of_thought`] |
//! | debate, debate_physician_role      | [`debate`]           |
//! | planner_specialists                | [`planner`]          |
//! | majority_vote                      | [`majority`]         |
//! | progressive_temperature            | [`progressive`]      |
//! | progressive_temperature_parallel   | [`parallel`]         |
//! | graph_of_thoughts                  | [`graph_of_thoughts`]|

pub mod chain_of_thought;
pub mod context;
pub mod debate;
pub mod graph_of_thoughts;
pub mod majority;
pub mod parallel;
pub mod planner;
pub mod progressive;
pub mod stage;
pub mod zero_shot;

#[cfg(test)]
pub(crate) mod testing;

pub use context::StrategyContext;
pub use stage::{RecoverableError, Stage, StageError, StageRunner, non_empty};

use crate::ports::llm_gateway::GatewayError;
use async_trait::async_trait;
use medqa_domain::{AnswerLetter, QuestionRecord, QuestionResult, StrategyKind, ThoughtGraph};
use tracing::{debug, warn};

/// Final answer of a strategy, with the reasoning graph when it built one.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub answer: AnswerLetter,
    pub graph: Option<ThoughtGraph>,
}

impl From<AnswerLetter> for Decision {
    fn from(answer: AnswerLetter) -> Self {
        Self { answer, graph: None }
    }
}

/// A complete multi-call reasoning architecture.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Run all stages for one question.
    async fn decide(&self, question: &QuestionRecord, runner: &mut StageRunner<'_>) -> Result<Decision, StageError>;
}

/// Strategy implementation for a registry name.
pub fn build_strategy(kind: StrategyKind) -> Box<dyn Strategy> {
    match kind {
        StrategyKind::ZeroShot => Box::new(zero_shot::ZeroShot::plain()),
        StrategyKind::ZeroShotPhysician => Box::new(zero_shot::ZeroShot::physician()),
        StrategyKind::ChainOfThought => Box::new(chain_of_thought::ChainOfThought),
        StrategyKind::Debate => Box::new(debate::Debate::clinical()),
        StrategyKind::PhysicianDebate => Box::new(debate::Debate::physician()),
        StrategyKind::PlannerSpecialists => Box::new(planner::PlannerSpecialists),
        StrategyKind::MajorityVote => Box::new(majority::MajorityVote),
        StrategyKind::ProgressiveTemperature => Box::new(progressive::ProgressiveTemperature),
        StrategyKind::ProgressiveTemperatureParallel => Box::new(parallel::ProgressiveParallel),
        StrategyKind::GraphOfThoughts => Box::new(graph_of_thoughts::GraphOfThoughts),
    }
}

/// Run `strategy` on one question under the question budget.
///
/// Only an unavailable backend is returned as an error; every other
/// failure is recorded on the result.
pub async fn answer_question(
    strategy: &dyn Strategy,
    ctx: &StrategyContext,
    question: &QuestionRecord,
) -> Result<QuestionResult, GatewayError> {
    let budget = ctx.config.question_budget(strategy.kind());
    let mut runner = StageRunner::new(ctx, budget);
    let outcome = strategy.decide(question, &mut runner).await;
    let traces = runner.into_traces();

    match outcome {
        Ok(decision) => {
            debug!("Question {} answered {}", question.id, decision.answer);
            let result = QuestionResult::answered(question, decision.answer, traces);
            Ok(match decision.graph {
                Some(graph) => result.with_graph(graph),
                None => result,
            })
        }
        Err(err) => {
            let error = err.into_question_error()?;
            warn!("Question {} failed: {}: {}", question.id, error.kind, error.message);
            Ok(QuestionResult::failed(question, error, traces))
        }
    }
}

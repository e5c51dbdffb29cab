//! Single-shot chain of thought: one call with step-by-step instructions.

use super::{Decision, Stage, StageError, StageRunner, Strategy};
use async_trait::async_trait;
use medqa_domain::{PromptTemplate, QuestionRecord, StrategyKind};

pub struct ChainOfThought;

#[async_trait]
impl Strategy for ChainOfThought {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ChainOfThought
    }

    async fn decide(&self, question: &QuestionRecord, runner: &mut StageRunner<'_>) -> Result<Decision, StageError> {
        let config = &runner.context().config;
        let stage = Stage::new(
            "ask_with_cot",
            PromptTemplate::chain_of_thought(question),
            config.temperature,
            config.max_output_tokens,
        );
        Ok(runner.run_answer(stage).await?.into())
    }
}

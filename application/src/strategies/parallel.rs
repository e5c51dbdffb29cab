//! Progressive temperature, parallel variant.
//!
//! `N` branches explore the same prompt at the exploration temperature,
//! blind to each other. A merge stage then builds a superset synthesis
//! and a decision stage picks the answer. Merge and decision always run at
//! temperature 0.0, whatever the configured temperatures are.

use super::{Decision, Stage, StageError, StageRunner, Strategy, non_empty};
use async_trait::async_trait;
use medqa_domain::{PromptTemplate, QuestionRecord, StrategyKind};

/// Temperature of the merge and decision stages.
pub const SYNTHESIS_TEMPERATURE: f32 = 0.0;

pub struct ProgressiveParallel;

#[async_trait]
impl Strategy for ProgressiveParallel {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ProgressiveTemperatureParallel
    }

    async fn decide(&self, question: &QuestionRecord, runner: &mut StageRunner<'_>) -> Result<Decision, StageError> {
        let config = runner.context().config.as_ref();
        let prompt = PromptTemplate::broad_exploration(question);

        let branches = (1..=config.parallel_branches)
            .map(|i| {
                Stage::new(
                    format!("parallel.branch{i}"),
                    prompt.clone(),
                    config.exploration_temperature,
                    config.max_output_tokens,
                )
            })
            .collect();
        let outputs: Vec<String> = runner
            .run_independent(branches, |_, raw| non_empty(raw))
            .await?;

        let merge = Stage::new(
            "parallel.merge",
            PromptTemplate::parallel_merge(question, &outputs),
            SYNTHESIS_TEMPERATURE,
            config.aggregator_max_tokens,
        );
        let synthesis = runner.run_text(merge).await?;

        let decision = Stage::new(
            "parallel.final",
            PromptTemplate::parallel_final(question, &synthesis, outputs.len()),
            SYNTHESIS_TEMPERATURE,
            config.max_output_tokens,
        );
        Ok(runner.run_answer(decision).await?.into())
    }
}

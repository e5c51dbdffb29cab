//! Progressive temperature: a linear chain that cools from broad
//! exploration to a zero-temperature decision.
//!
//! With the default schedule `[1.0, 0.7, 0.5, 0.3, 0.0]` the stages are:
//! exploration, evidence, prioritization, deep analysis, decision. Each
//! stage sees the output of the one before it.

use super::{Decision, Stage, StageError, StageRunner, Strategy};
use async_trait::async_trait;
use medqa_domain::{PromptTemplate, QuestionRecord, StrategyKind};

pub struct ProgressiveTemperature;

#[async_trait]
impl Strategy for ProgressiveTemperature {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ProgressiveTemperature
    }

    async fn decide(&self, question: &QuestionRecord, runner: &mut StageRunner<'_>) -> Result<Decision, StageError> {
        let config = runner.context().config.as_ref();
        let temperatures = config.progressive_schedule.temperatures();
        // The schedule guarantees at least two stages ending at 0.0.
        let (final_temperature, chain) = match temperatures.split_last() {
            Some((last, chain)) => (*last, chain),
            None => (0.0, &[][..]),
        };

        let mut previous = String::new();
        for (i, temperature) in chain.iter().enumerate() {
            let (name, prompt) = match i {
                0 => ("progressive.explore".to_string(), PromptTemplate::broad_exploration(question)),
                _ => (
                    format!("progressive.step{i}"),
                    PromptTemplate::progressive_step(question, i - 1, &previous),
                ),
            };
            let stage = Stage::new(name, prompt, *temperature, config.max_output_tokens);
            previous = runner.run_text(stage).await?;
        }

        let stage = Stage::new(
            "progressive.final",
            PromptTemplate::progressive_final(question, &previous),
            final_temperature,
            config.max_output_tokens,
        );
        Ok(runner.run_answer(stage).await?.into())
    }
}

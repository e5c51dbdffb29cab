//! Independent specialists with majority voting.
//!
//! 1. A selection stage names the most relevant specialties, one per line.
//!    Names outside the catalog are dropped and the selection is backfilled
//!    from the catalog heuristics up to `voting_agents`.
//! 2. Each specialist answers alone, blind to the others.
//! 3. A strict majority decides without another call. On a split vote a
//!    synthesis stage reviews every analysis and names the answer.

use super::{Decision, RecoverableError, Stage, StageError, StageRunner, Strategy, non_empty};
use async_trait::async_trait;
use medqa_domain::{
    AnswerLetter, MajorityPromptTemplate, QuestionRecord, StrategyKind, VoteTally, parse_answer, repair,
};
use tracing::debug;

pub struct MajorityVote;

#[async_trait]
impl Strategy for MajorityVote {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MajorityVote
    }

    async fn decide(&self, question: &QuestionRecord, runner: &mut StageRunner<'_>) -> Result<Decision, StageError> {
        let ctx = runner.context();
        let config = ctx.config.as_ref();
        let catalog = ctx.catalog.as_ref();
        let agents = config.voting_agents;

        let stage = Stage::new(
            "majority.select",
            MajorityPromptTemplate::selection(question, catalog, agents),
            config.planner_temperature(),
            config.planner_max_tokens,
        );
        let named = runner
            .run_parsed(stage, |raw| non_empty(raw).map(|text| catalog.mentioned_ids(&text)))
            .await?;
        let scored = catalog.heuristic_scores(&question.question_text);
        let selected = repair(&named, catalog, &scored, agents);
        debug!("Voting specialists: {}", selected.join(", "));

        let entries: Vec<_> = selected.iter().filter_map(|id| catalog.get(id)).collect();
        let stages = entries
            .iter()
            .map(|entry| {
                Stage::new(
                    format!("majority.agent.{}", entry.specialty_id),
                    MajorityPromptTemplate::agent(question, entry),
                    config.specialist_temperature(),
                    config.max_output_tokens,
                )
            })
            .collect();
        let votes: Vec<(AnswerLetter, String)> = runner
            .run_independent(stages, |_, raw| {
                parse_answer(raw)
                    .map(|letter| (letter, raw.to_string()))
                    .map_err(RecoverableError::answer)
            })
            .await?;

        let letters: Vec<AnswerLetter> = votes.iter().map(|(letter, _)| *letter).collect();
        if let Some(answer) = VoteTally::from_votes(&letters).majority() {
            debug!("Majority for {} among {} agents", answer, letters.len());
            return Ok(answer.into());
        }

        let analyses: Vec<_> = entries
            .iter()
            .zip(&votes)
            .map(|(entry, (letter, text))| (*entry, *letter, text.as_str()))
            .collect();
        let stage = Stage::new(
            "majority.synthesis",
            MajorityPromptTemplate::synthesis(question, &analyses),
            config.aggregator_temperature(),
            config.max_output_tokens,
        );
        Ok(runner.run_answer(stage).await?.into())
    }
}

//! Planner → specialists → aggregator.
//!
//! 1. The planner triages the case, scores the catalog and picks `top_k`
//!    specialties. Ids outside the catalog trigger one strengthened retry;
//!    if the selection is still invalid it is repaired by backfill.
//! 2. Each selected specialist reports a short differential. The reports
//!    are independent of each other.
//! 3. The aggregator weighs the reports and names the answer.

use super::{Decision, RecoverableError, Stage, StageError, StageRunner, Strategy};
use async_trait::async_trait;
use medqa_domain::{
    AggregatorDecision, AnswerLetter, PlannerOutput, PlannerPromptTemplate, QuestionErrorKind,
    QuestionRecord, ScoreSource, ScoredSpecialty, SpecialistReport, SpecialtyCatalog, StrategyKind,
    parse_answer, repair,
};
use tracing::{debug, info};

pub struct PlannerSpecialists;

impl PlannerSpecialists {
    async fn triage(
        &self,
        question: &QuestionRecord,
        runner: &mut StageRunner<'_>,
    ) -> Result<PlannerOutput, StageError> {
        let ctx = runner.context();
        let catalog = ctx.catalog.as_ref();
        let stage = Stage::new(
            "planner.triage",
            PlannerPromptTemplate::triage(question, catalog, ctx.config.top_k),
            ctx.config.planner_temperature(),
            ctx.config.planner_max_tokens,
        );

        let parse = |raw: &str| -> Result<PlannerOutput, RecoverableError> {
            let output = PlannerOutput::parse(raw).map_err(RecoverableError::json)?;
            catalog
                .validate(&output.selected_specialties)
                .map_err(|err| RecoverableError::catalog(err, catalog.ids().map(str::to_string).collect()))?;
            Ok(output)
        };

        match runner.run_parsed(stage, parse).await {
            Ok(output) => Ok(output),
            Err(StageError::Exhausted(err)) if err.kind == QuestionErrorKind::InvalidCatalogValue => {
                // Last reply parsed as JSON; keep its valid ids and backfill the rest.
                info!("Planner selection still invalid after retry, repairing: {}", err.message);
                runner
                    .traces()
                    .last()
                    .and_then(|trace| PlannerOutput::parse(&trace.raw_response_text).ok())
                    .ok_or(StageError::Exhausted(err))
            }
            Err(err) => Err(err),
        }
    }
}

/// Final selection of exactly `k` valid ids (or every candidate, if fewer).
///
/// Planner scores rank ahead of the catalog's own keyword heuristics.
pub fn select_specialties(
    output: &PlannerOutput,
    catalog: &SpecialtyCatalog,
    question: &QuestionRecord,
    k: usize,
) -> Vec<String> {
    let mut scored: Vec<ScoredSpecialty> = output
        .scored_catalog
        .iter()
        .cloned()
        .map(|s| s.with_source(ScoreSource::Planner))
        .collect();
    scored.extend(catalog.heuristic_scores(&question.question_text));
    repair(&output.selected_specialties, catalog, &scored, k)
}

#[async_trait]
impl Strategy for PlannerSpecialists {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PlannerSpecialists
    }

    async fn decide(&self, question: &QuestionRecord, runner: &mut StageRunner<'_>) -> Result<Decision, StageError> {
        let ctx = runner.context();
        let config = ctx.config.as_ref();
        let catalog = ctx.catalog.as_ref();

        let plan = self.triage(question, runner).await?;
        let selected = select_specialties(&plan, catalog, question, config.top_k);
        debug!("Selected specialists: {}", selected.join(", "));

        let stages = selected
            .iter()
            .filter_map(|id| catalog.get(id))
            .map(|entry| {
                Stage::new(
                    format!("planner.specialist.{}", entry.specialty_id),
                    PlannerPromptTemplate::specialist(question, entry, &plan.rationale),
                    config.specialist_temperature(),
                    config.max_output_tokens,
                )
            })
            .collect();
        let reports: Vec<SpecialistReport> = runner
            .run_independent(stages, |index, raw| {
                SpecialistReport::parse(raw, &selected[index]).map_err(RecoverableError::json)
            })
            .await?;

        let stage = Stage::new(
            "planner.aggregator",
            PlannerPromptTemplate::aggregator(question, &reports),
            config.aggregator_temperature(),
            config.aggregator_max_tokens,
        );
        let answer = runner.run_parsed(stage, parse_aggregator).await?;
        Ok(answer.into())
    }
}

/// Aggregator JSON, or a plain answer marker when the JSON is unusable.
fn parse_aggregator(raw: &str) -> Result<AnswerLetter, RecoverableError> {
    match AggregatorDecision::parse(raw) {
        Ok(decision) => Ok(decision.final_answer),
        Err(json_err) => parse_answer(raw).map_err(|_| RecoverableError::json(json_err)),
    }
}

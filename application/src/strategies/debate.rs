//! Two-agent debate with a judge.
//!
//! `A opens → B opens → [A rebuts → B rebuts] × (R−1) → judge`.
//! The debate always runs every round, even when both agents agree from
//! the start. Each prompt carries the full transcript because the gateway
//! keeps no state between calls.

use super::{Decision, Stage, StageError, StageRunner, Strategy};
use async_trait::async_trait;
use medqa_domain::{DebatePersona, DebatePromptTemplate, DebateTurn, QuestionRecord, StrategyKind};

pub struct Debate {
    kind: StrategyKind,
    first: DebatePersona,
    second: DebatePersona,
}

impl Debate {
    pub fn clinical() -> Self {
        let (first, second) = DebatePersona::clinical_pair();
        Self {
            kind: StrategyKind::Debate,
            first,
            second,
        }
    }

    pub fn physician() -> Self {
        let (first, second) = DebatePersona::physician_pair();
        Self {
            kind: StrategyKind::PhysicianDebate,
            first,
            second,
        }
    }

    async fn speak(
        &self,
        runner: &mut StageRunner<'_>,
        transcript: &mut Vec<DebateTurn>,
        round: usize,
        persona: &DebatePersona,
        stage_name: String,
        prompt: String,
    ) -> Result<(), StageError> {
        let config = &runner.context().config;
        let stage = Stage::new(stage_name, prompt, config.temperature, config.max_output_tokens);
        let text = runner.run_text(stage).await?;
        transcript.push(DebateTurn {
            round,
            speaker: persona.name.to_string(),
            text,
        });
        Ok(())
    }
}

#[async_trait]
impl Strategy for Debate {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    async fn decide(&self, question: &QuestionRecord, runner: &mut StageRunner<'_>) -> Result<Decision, StageError> {
        let config = runner.context().config.clone();
        let (a, b) = (&self.first, &self.second);
        let mut transcript = Vec::new();

        let prompt = DebatePromptTemplate::opening(a, question);
        self.speak(runner, &mut transcript, 1, a, "debate.round1.a".into(), prompt)
            .await?;
        let prompt = DebatePromptTemplate::counter_opening(b, a, question, &transcript);
        self.speak(runner, &mut transcript, 1, b, "debate.round1.b".into(), prompt)
            .await?;

        for round in 2..=config.debate_rounds {
            let prompt = DebatePromptTemplate::rebuttal(a, b, round, question, &transcript);
            self.speak(runner, &mut transcript, round, a, format!("debate.round{round}.a"), prompt)
                .await?;
            let prompt = DebatePromptTemplate::rebuttal(b, a, round, question, &transcript);
            self.speak(runner, &mut transcript, round, b, format!("debate.round{round}.b"), prompt)
                .await?;
        }

        let stage = Stage::new(
            "debate.judge",
            DebatePromptTemplate::judge(a, b, question, &transcript),
            config.temperature,
            config.max_output_tokens,
        );
        Ok(runner.run_answer(stage).await?.into())
    }
}

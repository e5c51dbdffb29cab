//! Zero-shot baselines: one call, question and options only.

use super::{Decision, Stage, StageError, StageRunner, Strategy};
use async_trait::async_trait;
use medqa_domain::{PromptTemplate, QuestionRecord, StrategyKind};

pub struct ZeroShot {
    physician: bool,
}

impl ZeroShot {
    pub fn plain() -> Self {
        Self { physician: false }
    }

    /// Same call with an experienced-physician role line.
    pub fn physician() -> Self {
        Self { physician: true }
    }
}

#[async_trait]
impl Strategy for ZeroShot {
    fn kind(&self) -> StrategyKind {
        if self.physician {
            StrategyKind::ZeroShotPhysician
        } else {
            StrategyKind::ZeroShot
        }
    }

    async fn decide(&self, question: &QuestionRecord, runner: &mut StageRunner<'_>) -> Result<Decision, StageError> {
        let config = &runner.context().config;
        let prompt = if self.physician {
            PromptTemplate::zero_shot_physician(question)
        } else {
            PromptTemplate::zero_shot(question)
        };
        let stage = Stage::new("ask", prompt, config.temperature, config.max_output_tokens);
        Ok(runner.run_answer(stage).await?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::strategies::answer_question;
    use crate::strategies::testing::{ScriptedGateway, context, sample_question};
    use medqa_domain::{AnswerLetter, QuestionErrorKind};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_single_call() {
        let gateway = Arc::new(ScriptedGateway::texts(&["Reasoning...\nANSWER: A"]));
        let ctx = context(gateway.clone(), RunConfig::default());

        let result = answer_question(&ZeroShot::plain(), &ctx, &sample_question())
            .await
            .unwrap();
        assert_eq!(result.predicted_answer, Some(AnswerLetter::A));
        assert!(result.is_correct);
        assert_eq!(result.call_traces.len(), 1);
        assert_eq!(result.call_traces[0].stage_name, "ask");
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_answer_gets_one_strengthened_retry() {
        let gateway = Arc::new(ScriptedGateway::texts(&["I am not sure.", "ANSWER: C"]));
        let ctx = context(gateway.clone(), RunConfig::default());

        let result = answer_question(&ZeroShot::physician(), &ctx, &sample_question())
            .await
            .unwrap();
        assert_eq!(result.predicted_answer, Some(AnswerLetter::C));
        assert_eq!(result.call_traces.len(), 2);
        assert!(result.call_traces[0].is_error());
        assert!(!result.call_traces[1].is_error());

        let requests = gateway.requests();
        assert!(requests[1].prompt.starts_with(&requests[0].prompt));
        assert!(requests[1].prompt.contains("ANSWER: X"));
    }

    #[tokio::test]
    async fn test_second_parse_failure_fails_question() {
        let gateway = Arc::new(ScriptedGateway::texts(&["no idea", "still no idea"]));
        let ctx = context(gateway.clone(), RunConfig::default());

        let result = answer_question(&ZeroShot::plain(), &ctx, &sample_question())
            .await
            .unwrap();
        assert_eq!(result.predicted_answer, None);
        assert_eq!(result.error.as_ref().unwrap().kind, QuestionErrorKind::AnswerParse);
        assert_eq!(gateway.call_count(), 2);
    }
}

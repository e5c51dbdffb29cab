//! Test doubles shared by strategy and use case tests.

use super::context::StrategyContext;
use crate::config::RunConfig;
use crate::gateway::GatewayClient;
use crate::ports::llm_gateway::{Completion, CompletionRequest, GatewayError, LlmGateway};
use async_trait::async_trait;
use medqa_domain::{AnswerLetter, QuestionRecord, SpecialtyCatalog};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Responder = Box<dyn Fn(&CompletionRequest) -> Result<String, GatewayError> + Send + Sync>;

/// Gateway that replays queued responses, then falls back to a responder.
pub(crate) struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<String, GatewayError>>>,
    responder: Responder,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedGateway {
    pub fn new(responses: Vec<Result<String, GatewayError>>) -> Self {
        Self::with_responder(responses, |_| Err(GatewayError::MalformedResponse("script exhausted".into())))
    }

    pub fn texts(responses: &[&str]) -> Self {
        Self::new(responses.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn repeating(text: &str) -> Self {
        let text = text.to_string();
        Self::with_responder(Vec::new(), move |_| Ok(text.clone()))
    }

    pub fn with_responder<F>(responses: Vec<Result<String, GatewayError>>, responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, GatewayError> + Send + Sync + 'static,
    {
        Self {
            responses: Mutex::new(responses.into()),
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn generate(&self, request: &CompletionRequest) -> Result<Completion, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.responses.lock().unwrap().pop_front();
        let text = match next {
            Some(response) => response?,
            None => (self.responder)(request)?,
        };
        Ok(Completion {
            token_count: text.split_whitespace().count() as u64,
            text,
            latency_seconds: 0.01,
        })
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

pub(crate) fn context(gateway: Arc<ScriptedGateway>, config: RunConfig) -> StrategyContext {
    StrategyContext::new(
        GatewayClient::new(gateway),
        Arc::new(SpecialtyCatalog::standard()),
        Arc::new(config),
    )
}

pub(crate) fn sample_question() -> QuestionRecord {
    QuestionRecord::new(
        "q00000",
        "A 24-year-old woman presents with fever, neck stiffness and photophobia. \
         Lumbar puncture shows neutrophilic pleocytosis and low glucose. \
         What is the most appropriate next step?",
        [
            "Empiric IV ceftriaxone and vancomycin".to_string(),
            "Oral amoxicillin".to_string(),
            "Repeat lumbar puncture in 24 hours".to_string(),
            "Observation only".to_string(),
        ],
        AnswerLetter::A,
    )
}

//! Question and run result entities

use super::trace::CallTrace;
use crate::core::question::{AnswerLetter, QuestionRecord};
use crate::strategy::graph::ThoughtGraph;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a question produced no answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionErrorKind {
    /// No option letter (or required structure) after the strengthened retry.
    AnswerParse,
    /// Catalog ids still invalid after the strengthened retry.
    InvalidCatalogValue,
    /// The backend kept returning unusable payloads.
    MalformedResponse,
    /// A call timed out twice (initial attempt and its retry).
    Timeout,
    /// The question-level time budget ran out.
    QuestionBudgetExceeded,
}

impl QuestionErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AnswerParse => "answer_parse",
            Self::InvalidCatalogValue => "invalid_catalog_value",
            Self::MalformedResponse => "malformed_response",
            Self::Timeout => "timeout",
            Self::QuestionBudgetExceeded => "question_budget_exceeded",
        }
    }
}

impl std::fmt::Display for QuestionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error captured on a failed question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionError {
    pub kind: QuestionErrorKind,
    pub message: String,
}

impl QuestionError {
    pub fn new(kind: QuestionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of one strategy run over one question.
///
/// When `error` is set, `predicted_answer` is `None` and the question is
/// excluded from the accuracy denominator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: String,
    pub predicted_answer: Option<AnswerLetter>,
    pub correct_answer: AnswerLetter,
    pub is_correct: bool,
    pub call_traces: Vec<CallTrace>,
    pub total_tokens: u64,
    pub total_latency_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<QuestionError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<ThoughtGraph>,
}

impl QuestionResult {
    pub fn answered(question: &QuestionRecord, answer: AnswerLetter, call_traces: Vec<CallTrace>) -> Self {
        let mut result = Self::base(question, call_traces);
        result.predicted_answer = Some(answer);
        result.is_correct = question.is_correct(answer);
        result
    }

    pub fn failed(question: &QuestionRecord, error: QuestionError, call_traces: Vec<CallTrace>) -> Self {
        let mut result = Self::base(question, call_traces);
        result.error = Some(error);
        result
    }

    fn base(question: &QuestionRecord, call_traces: Vec<CallTrace>) -> Self {
        let total_tokens = call_traces.iter().map(|t| t.token_count).sum();
        let total_latency_seconds = call_traces.iter().map(|t| t.latency_seconds).sum();
        Self {
            question_id: question.id.clone(),
            predicted_answer: None,
            correct_answer: question.correct_answer,
            is_correct: false,
            call_traces,
            total_tokens,
            total_latency_seconds,
            error: None,
            graph: None,
        }
    }

    pub fn with_graph(mut self, graph: ThoughtGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn call_count(&self) -> usize {
        self.call_traces.len()
    }
}

/// Accumulated results of one strategy over a dataset prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub strategy_name: String,
    pub config_snapshot: serde_json::Value,
    pub question_results: Vec<QuestionResult>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl RunResult {
    pub fn new(strategy_name: impl Into<String>, config_snapshot: serde_json::Value) -> Self {
        Self {
            strategy_name: strategy_name.into(),
            config_snapshot,
            question_results: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Number of dataset entries already processed.
    pub fn completed_count(&self) -> usize {
        self.question_results.len()
    }

    pub fn push(&mut self, result: QuestionResult) {
        self.question_results.push(result);
    }

    pub fn mark_completed(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Reopen a completed run so more questions can be appended.
    pub fn reopen(&mut self) {
        self.completed_at = None;
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Question ids in processing order.
    pub fn question_ids(&self) -> impl Iterator<Item = &str> {
        self.question_results.iter().map(|r| r.question_id.as_str())
    }
}

//! LLM Gateway port
//!
//! Defines the interface for communicating with an inference backend.
//! Every request is self-contained: the gateway keeps no conversation
//! state between calls, so multi-turn strategies resend their full context.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during a single gateway call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// No response within the per-call timeout.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// The backend cannot be reached at all. Fatal for the whole run.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend answered with an error payload or non-text body.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl GatewayError {
    /// Whether the run must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GatewayError::BackendUnavailable(_))
    }
}

/// One generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32, max_tokens: u32, timeout: Duration) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            max_tokens,
            timeout,
        }
    }
}

/// A successful generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub token_count: u64,
    pub latency_seconds: f64,
}

/// Prompt used for the warm-up generation.
pub const WARM_UP_PROMPT: &str = "Hello, this is a test.";

/// Gateway for LLM communication
///
/// This port defines how the application layer talks to inference backends.
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Run one generation.
    ///
    /// Implementations should honor `request.timeout` themselves where the
    /// transport supports it; the caller also enforces it.
    async fn generate(&self, request: &CompletionRequest) -> Result<Completion, GatewayError>;

    /// Backend identifier for logs and run snapshots.
    fn describe(&self) -> String {
        "llm".to_string()
    }

    /// Tiny generation issued once before a batch so cold model loading is
    /// not charged to the first question.
    async fn warm_up(&self, timeout: Duration) -> Result<(), GatewayError> {
        self.generate(&CompletionRequest::new(WARM_UP_PROMPT, 0.0, 8, timeout))
            .await
            .map(|_| ())
    }
}

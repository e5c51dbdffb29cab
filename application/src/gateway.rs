//! Gateway client: timeout enforcement and the timeout retry policy.
//!
//! Adapters implement [`LlmGateway`]; strategies never call them directly.
//! [`GatewayClient`] bounds every attempt by the request timeout and repeats
//! a timed-out call once. Malformed responses and unavailable backends are
//! returned unchanged.

use crate::ports::llm_gateway::{Completion, CompletionRequest, GatewayError, LlmGateway};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Attempts made after the first one when a call times out.
pub const TIMEOUT_RETRIES: usize = 1;

/// An attempt that did not produce a completion.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedAttempt {
    pub error: GatewayError,
    pub latency_seconds: f64,
}

/// Everything that happened for one logical call.
#[derive(Debug)]
pub struct GatewayCall {
    /// Failed attempts in order, excluding the final one.
    pub retried: Vec<FailedAttempt>,
    /// Final outcome.
    pub result: Result<Completion, GatewayError>,
    /// Wall time of the final attempt.
    pub latency_seconds: f64,
}

#[derive(Clone)]
pub struct GatewayClient {
    gateway: Arc<dyn LlmGateway>,
    timeout_retries: usize,
}

impl GatewayClient {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self {
            gateway,
            timeout_retries: TIMEOUT_RETRIES,
        }
    }

    pub fn with_timeout_retries(mut self, retries: usize) -> Self {
        self.timeout_retries = retries;
        self
    }

    pub fn describe(&self) -> String {
        self.gateway.describe()
    }

    pub async fn warm_up(&self, timeout: Duration) -> Result<(), GatewayError> {
        match tokio::time::timeout(timeout, self.gateway.warm_up(timeout)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(timeout)),
        }
    }

    /// Run one logical call, retrying on timeout.
    pub async fn generate(&self, request: &CompletionRequest) -> GatewayCall {
        let mut retried = Vec::new();
        loop {
            let started = Instant::now();
            let result = match tokio::time::timeout(request.timeout, self.gateway.generate(request)).await {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Timeout(request.timeout)),
            };
            let latency_seconds = started.elapsed().as_secs_f64();

            match result {
                Err(GatewayError::Timeout(limit)) if retried.len() < self.timeout_retries => {
                    warn!("Gateway call timed out after {:?}, retrying", limit);
                    retried.push(FailedAttempt {
                        error: GatewayError::Timeout(limit),
                        latency_seconds,
                    });
                }
                result => {
                    if let Ok(completion) = &result {
                        debug!(
                            "Gateway call finished: {} tokens in {:.2}s",
                            completion.token_count, latency_seconds
                        );
                    }
                    return GatewayCall {
                        retried,
                        result,
                        latency_seconds,
                    };
                }
            }
        }
    }
}

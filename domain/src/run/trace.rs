//! Call trace entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit record of one LLM Gateway invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallTrace {
    pub stage_name: String,
    pub prompt_text: String,
    pub temperature: f32,
    pub raw_response_text: String,
    pub token_count: u64,
    pub latency_seconds: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallTrace {
    /// Trace of a call that returned text.
    pub fn success(
        stage_name: impl Into<String>,
        prompt_text: impl Into<String>,
        temperature: f32,
        raw_response_text: impl Into<String>,
        token_count: u64,
        latency_seconds: f64,
    ) -> Self {
        Self {
            stage_name: stage_name.into(),
            prompt_text: prompt_text.into(),
            temperature,
            raw_response_text: raw_response_text.into(),
            token_count,
            latency_seconds,
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// Trace of a call that failed before producing text.
    pub fn failure(
        stage_name: impl Into<String>,
        prompt_text: impl Into<String>,
        temperature: f32,
        latency_seconds: f64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            stage_name: stage_name.into(),
            prompt_text: prompt_text.into(),
            temperature,
            raw_response_text: String::new(),
            token_count: 0,
            latency_seconds,
            timestamp: Utc::now(),
            error: Some(error.into()),
        }
    }

    /// Annotate a successful call whose output was later rejected.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_trace_has_no_error() {
        let trace = CallTrace::success("ask", "prompt", 0.0, "ANSWER: B", 42, 1.5);
        assert!(!trace.is_error());
        assert_eq!(trace.token_count, 42);
    }

    #[test]
    fn test_failure_trace_is_empty() {
        let trace = CallTrace::failure("ask", "prompt", 0.3, 30.0, "timed out after 30s");
        assert!(trace.is_error());
        assert!(trace.raw_response_text.is_empty());
        assert_eq!(trace.token_count, 0);
    }

    #[test]
    fn test_error_field_omitted_when_absent() {
        let trace = CallTrace::success("ask", "p", 0.0, "r", 1, 0.1);
        let json = serde_json::to_value(&trace).unwrap();
        assert!(json.get("error").is_none());
    }
}

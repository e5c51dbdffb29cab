//! OpenAI-compatible backend (vLLM, OpenAI and anything speaking the same API).

use super::http::post_json;
use async_trait::async_trait;
use medqa_application::{Completion, CompletionRequest, GatewayError, LlmGateway};
use serde_json::{Value, json};
use std::time::Instant;
use tracing::debug;

pub const DEFAULT_VLLM_URL: &str = "http://localhost:8000";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

/// Client for `/v1/chat/completions` or `/v1/completions`.
pub struct OpenAiCompatGateway {
    client: reqwest::Client,
    label: &'static str,
    base_url: String,
    model: String,
    api_key: Option<String>,
    use_chat_api: bool,
}

impl OpenAiCompatGateway {
    pub fn new(
        client: reqwest::Client,
        label: &'static str,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            label,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            use_chat_api: true,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.is_empty());
        self
    }

    pub fn with_chat_api(mut self, enabled: bool) -> Self {
        self.use_chat_api = enabled;
        self
    }

    fn endpoint(&self) -> String {
        // Accept base URLs configured either with or without the /v1 suffix.
        let root = self.base_url.trim_end_matches("/v1");
        match self.use_chat_api {
            true => format!("{}/v1/chat/completions", root),
            false => format!("{}/v1/completions", root),
        }
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        if self.use_chat_api {
            json!({
                "model": self.model,
                "messages": [{"role": "user", "content": request.prompt}],
                "temperature": request.temperature,
                "max_tokens": request.max_tokens,
            })
        } else {
            json!({
                "model": self.model,
                "prompt": request.prompt,
                "temperature": request.temperature,
                "max_tokens": request.max_tokens,
            })
        }
    }
}

fn parse_reply(body: &Value, chat: bool) -> Result<(String, u64), GatewayError> {
    let choice = body
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| GatewayError::MalformedResponse("reply has no choices".to_string()))?;
    let text = match chat {
        true => choice.get("message").and_then(|m| m.get("content")),
        false => choice.get("text"),
    }
    .and_then(Value::as_str)
    .ok_or_else(|| GatewayError::MalformedResponse("choice carries no text".to_string()))?;

    let tokens = body
        .get("usage")
        .and_then(|u| u.get("total_tokens"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    Ok((text.to_string(), tokens))
}

#[async_trait]
impl LlmGateway for OpenAiCompatGateway {
    async fn generate(&self, request: &CompletionRequest) -> Result<Completion, GatewayError> {
        let started = Instant::now();
        let body = post_json(
            &self.client,
            &self.endpoint(),
            &self.request_body(request),
            request.timeout,
            self.api_key.as_deref(),
        )
        .await?;
        let (text, token_count) = parse_reply(&body, self.use_chat_api)?;
        let latency_seconds = started.elapsed().as_secs_f64();
        debug!("{} returned {} tokens in {:.2}s", self.label, token_count, latency_seconds);
        Ok(Completion {
            text,
            token_count,
            latency_seconds,
        })
    }

    fn describe(&self) -> String {
        format!("{}:{}", self.label, self.model)
    }
}

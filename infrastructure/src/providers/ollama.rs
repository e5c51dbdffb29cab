//! Ollama backend (`POST /api/generate`).

use super::http::post_json;
use async_trait::async_trait;
use medqa_application::{Completion, CompletionRequest, GatewayError, LlmGateway};
use serde_json::{Value, json};
use std::time::Instant;
use tracing::debug;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Non-streaming client for a local Ollama server.
pub struct OllamaGateway {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaGateway {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        json!({
            "model": self.model,
            "prompt": request.prompt,
            "stream": false,
            "options": {
                "temperature": request.temperature,
                "num_predict": request.max_tokens,
            },
        })
    }
}

/// Extract generated text and token usage from an Ollama reply.
fn parse_reply(body: &Value) -> Result<(String, u64), GatewayError> {
    let text = body
        .get("response")
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::MalformedResponse("missing 'response' field".to_string()))?;
    let count = |key: &str| body.get(key).and_then(Value::as_u64).unwrap_or(0);
    Ok((text.to_string(), count("prompt_eval_count") + count("eval_count")))
}

#[async_trait]
impl LlmGateway for OllamaGateway {
    async fn generate(&self, request: &CompletionRequest) -> Result<Completion, GatewayError> {
        let url = format!("{}/api/generate", self.base_url);
        let started = Instant::now();
        let body = post_json(&self.client, &url, &self.request_body(request), request.timeout, None).await?;
        let (text, token_count) = parse_reply(&body)?;
        let latency_seconds = started.elapsed().as_secs_f64();
        debug!("ollama returned {} tokens in {:.2}s", token_count, latency_seconds);
        Ok(Completion {
            text,
            token_count,
            latency_seconds,
        })
    }

    fn describe(&self) -> String {
        format!("ollama:{}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_request_body_shape() {
        let gateway = OllamaGateway::new(reqwest::Client::new(), "http://host:11434/", "llama3.1:8b");
        let request = CompletionRequest::new("Q?", 0.3, 800, Duration::from_secs(30));
        let body = gateway.request_body(&request);

        assert_eq!(body["model"], "llama3.1:8b");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 800);
        assert!((body["options"]["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert_eq!(gateway.base_url, "http://host:11434");
    }

    #[test]
    fn test_parse_reply_sums_token_counts() {
        let body = json!({"response": "Answer: B", "prompt_eval_count": 120, "eval_count": 8, "done": true});
        let (text, tokens) = parse_reply(&body).unwrap();
        assert_eq!(text, "Answer: B");
        assert_eq!(tokens, 128);
    }

    #[test]
    fn test_parse_reply_without_text_is_malformed() {
        let body = json!({"error": "oops"});
        assert!(matches!(parse_reply(&body), Err(GatewayError::MalformedResponse(_))));
    }

    #[test]
    fn test_describe() {
        let gateway = OllamaGateway::new(reqwest::Client::new(), DEFAULT_OLLAMA_URL, "mistral");
        assert_eq!(gateway.describe(), "ollama:mistral");
    }
}

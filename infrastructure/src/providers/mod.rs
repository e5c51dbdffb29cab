//! Inference backend adapters implementing [`LlmGateway`].

mod http;
pub mod ollama;
pub mod openai_compat;

use crate::config::{FileBackendConfig, PROVIDERS};
use medqa_application::{GatewayError, LlmGateway};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub use ollama::{DEFAULT_OLLAMA_URL, OllamaGateway};
pub use openai_compat::{DEFAULT_OPENAI_URL, DEFAULT_VLLM_URL, OpenAiCompatGateway};

/// Connection establishment limit; request time is bounded per call.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Ollama,
    Vllm,
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::Vllm => "vllm",
            ProviderKind::OpenAi => "openai",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => DEFAULT_OLLAMA_URL,
            ProviderKind::Vllm => DEFAULT_VLLM_URL,
            ProviderKind::OpenAi => DEFAULT_OPENAI_URL,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(ProviderKind::Ollama),
            "vllm" => Ok(ProviderKind::Vllm),
            "openai" | "openai-compatible" => Ok(ProviderKind::OpenAi),
            other => Err(format!(
                "unknown provider '{}' (expected one of: {})",
                other,
                PROVIDERS.join(", ")
            )),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the gateway described by the `[backend]` section.
pub fn build_gateway(config: &FileBackendConfig) -> Result<Arc<dyn LlmGateway>, GatewayError> {
    let kind: ProviderKind = config.provider.parse().map_err(GatewayError::BackendUnavailable)?;
    let base_url = config
        .base_url
        .clone()
        .unwrap_or_else(|| kind.default_base_url().to_string());

    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| GatewayError::BackendUnavailable(format!("failed to build HTTP client: {}", e)))?;

    info!("Using {} backend at {} (model: {})", kind, base_url, config.model);

    let gateway: Arc<dyn LlmGateway> = match kind {
        ProviderKind::Ollama => Arc::new(OllamaGateway::new(client, base_url, config.model.clone())),
        ProviderKind::Vllm | ProviderKind::OpenAi => {
            let api_key = std::env::var(&config.api_key_env).ok();
            if kind == ProviderKind::OpenAi && api_key.is_none() {
                warn!("{} is not set; requests will be sent without credentials", config.api_key_env);
            }
            Arc::new(
                OpenAiCompatGateway::new(client, kind.as_str(), base_url, config.model.clone())
                    .with_api_key(api_key)
                    .with_chat_api(config.use_chat_api),
            )
        }
    };
    Ok(gateway)
}

//! Shared HTTP plumbing for the inference backends.

use medqa_application::GatewayError;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Longest body excerpt carried in an error message.
const ERROR_BODY_LIMIT: usize = 300;

/// POST a JSON body and decode a JSON reply, mapping every failure onto
/// the gateway's error kinds.
pub(crate) async fn post_json(
    client: &reqwest::Client,
    url: &str,
    body: &Value,
    timeout: Duration,
    api_key: Option<&str>,
) -> Result<Value, GatewayError> {
    debug!("POST {}", url);
    let mut request = client.post(url).timeout(timeout).json(body);
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }

    let response = request
        .send()
        .await
        .map_err(|e| map_transport_error(&e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(map_status(status, &text, timeout));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| match e.is_timeout() {
            true => GatewayError::Timeout(timeout),
            false => GatewayError::MalformedResponse(format!("undecodable JSON body: {}", e)),
        })
}

pub(crate) fn map_transport_error(err: &reqwest::Error, timeout: Duration) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout(timeout)
    } else if err.is_connect() {
        GatewayError::BackendUnavailable(format!("cannot connect: {}", err))
    } else {
        GatewayError::MalformedResponse(err.to_string())
    }
}

pub(crate) fn map_status(status: StatusCode, body: &str, timeout: Duration) -> GatewayError {
    let excerpt = medqa_domain::core::string::truncate(body.trim(), ERROR_BODY_LIMIT);
    match status {
        StatusCode::GATEWAY_TIMEOUT => GatewayError::Timeout(timeout),
        StatusCode::NOT_FOUND => {
            GatewayError::BackendUnavailable(format!("model or endpoint not found (404): {}", excerpt))
        }
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
            GatewayError::BackendUnavailable(format!("HTTP {}: {}", status.as_u16(), excerpt))
        }
        _ => GatewayError::MalformedResponse(format!("HTTP {}: {}", status.as_u16(), excerpt)),
    }
}

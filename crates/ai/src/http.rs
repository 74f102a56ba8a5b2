// Shared blocking HTTP plumbing for the oracles

use std::time::Duration;

use ledgerlink_recon::OracleError;
use reqwest::blocking::{Client, RequestBuilder};

const USER_AGENT: &str = concat!("ledgerlink/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_client(timeout: Duration) -> Result<Client, OracleError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| OracleError::Network(e.to_string()))
}

/// Send the request and return the body of a 2xx response.
///
/// Non-success statuses become `OracleError::Api`, with the provider's
/// `error.message` when the body carries one.
pub(crate) fn send(request: RequestBuilder, provider: &str) -> Result<String, OracleError> {
    let response = request
        .send()
        .map_err(|e| OracleError::Network(format!("{provider}: {e}")))?;

    let status = response.status();
    let body = response
        .text()
        .map_err(|e| OracleError::Network(format!("{provider}: {e}")))?;

    if !status.is_success() {
        log::debug!("{provider} returned HTTP {}", status.as_u16());
        return Err(OracleError::Api {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    Ok(body)
}

/// `{"error": {"message": ...}}` is shared by OpenAI, Ollama and Gemini.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match &v["error"] {
            serde_json::Value::String(s) => Some(s.clone()),
            other => other["message"].as_str().map(str::to_string),
        })
        .unwrap_or_else(|| body.trim().to_string())
}

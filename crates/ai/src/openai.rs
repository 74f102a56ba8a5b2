// OpenAI-compatible chat completions (OpenAI, Ollama)

use std::time::Duration;

use ledgerlink_recon::{MatchOracle, OracleError, OracleRequest};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::http;

const OPENAI_API_BASE: &str = "https://api.openai.com";
const COMPLETIONS_PATH: &str = "/v1/chat/completions";
const TEMPERATURE: f64 = 0.1;

// ============================================================================
// API types
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

// ============================================================================
// Oracle
// ============================================================================

pub struct ChatCompletionsOracle {
    client: Client,
    provider: &'static str,
    api_key: Option<String>,
    model: String,
    base_url: String,
    /// Ask for `response_format: json_object` (OpenAI only).
    json_mode: bool,
}

impl ChatCompletionsOracle {
    pub fn openai(api_key: String, model: &str, timeout: Duration) -> Result<Self, OracleError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            provider: "openai",
            api_key: Some(api_key),
            model: model.to_string(),
            base_url: OPENAI_API_BASE.to_string(),
            json_mode: true,
        })
    }

    /// Ollama's OpenAI-compatible endpoint; no key, no JSON mode.
    pub fn local(endpoint: &str, model: &str, timeout: Duration) -> Result<Self, OracleError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            provider: "local",
            api_key: None,
            model: model.to_string(),
            base_url: endpoint.trim_end_matches('/').to_string(),
            json_mode: false,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!("{}{}", self.base_url, COMPLETIONS_PATH)
    }
}

impl MatchOracle for ChatCompletionsOracle {
    fn matches(&self, request: &OracleRequest<'_>) -> Result<String, OracleError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: TEMPERATURE,
            response_format: self.json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let mut builder = self.client.post(self.url()).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let text = http::send(builder, self.provider)?;
        let response: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| OracleError::InvalidResponse(format!("{}: {e}", self.provider)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OracleError::InvalidResponse("No choices in response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use ledgerlink_recon::Record;
    use serde_json::json;

    fn batch() -> Vec<Record> {
        vec![json!({"Invoice": "INV-1", "Amount": 10}).as_object().unwrap().clone()]
    }

    #[test]
    fn openai_request_shape() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("Authorization", "Bearer sk-test")
                .body_includes(r#""model":"gpt-4o""#)
                .body_includes(r#""temperature":0.1"#)
                .body_includes(r#""response_format":{"type":"json_object"}"#)
                .body_includes("File A:")
                .body_includes("INV-1");
            then.status(200).json_body(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"matches\": []}"}}]
            }));
        });

        let oracle = ChatCompletionsOracle::openai("sk-test".into(), "gpt-4o", Duration::from_secs(5))
            .unwrap()
            .with_base_url(&server.base_url());
        let a = batch();
        let raw = oracle.matches(&OracleRequest::new(&a, &a, 3)).unwrap();

        mock.assert();
        assert_eq!(raw, r#"{"matches": []}"#);
    }

    #[test]
    fn local_omits_key_and_json_mode() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(json!({
                "choices": [{"message": {"content": "```json\n{}\n```"}}]
            }));
        });

        let oracle =
            ChatCompletionsOracle::local(&format!("{}/", server.base_url()), "llama3:8b", Duration::from_secs(5))
                .unwrap();
        let a = batch();
        let raw = oracle.matches(&OracleRequest::new(&a, &a, 3)).unwrap();
        mock.assert();
        assert!(raw.starts_with("```json"));
        assert!(!oracle.json_mode);
        assert!(oracle.api_key.is_none());
    }

    #[test]
    fn api_error_carries_status_and_message() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(401)
                .json_body(json!({"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}));
        });

        let oracle = ChatCompletionsOracle::openai("bad".into(), "gpt-4o", Duration::from_secs(5))
            .unwrap()
            .with_base_url(&server.base_url());
        let a = batch();
        match oracle.matches(&OracleRequest::new(&a, &a, 3)) {
            Err(OracleError::Api { status, message }) => {
                assert_eq!(status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn empty_choices_is_invalid_response() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({"choices": []}));
        });

        let oracle = ChatCompletionsOracle::openai("k".into(), "gpt-4o", Duration::from_secs(5))
            .unwrap()
            .with_base_url(&server.base_url());
        let a = batch();
        let err = oracle.matches(&OracleRequest::new(&a, &a, 3)).unwrap_err();
        assert!(matches!(err, OracleError::InvalidResponse(_)));
    }

    #[test]
    fn unreachable_host_is_network_error() {
        let oracle = ChatCompletionsOracle::local("http://127.0.0.1:1", "llama3:8b", Duration::from_secs(2)).unwrap();
        let a = batch();
        let err = oracle.matches(&OracleRequest::new(&a, &a, 3)).unwrap_err();
        assert!(matches!(err, OracleError::Network(_)));
    }
}

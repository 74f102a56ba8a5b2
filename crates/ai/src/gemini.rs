// Google Gemini generateContent

use std::time::Duration;

use ledgerlink_recon::{MatchOracle, OracleError, OracleRequest};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::http;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
const TEMPERATURE: f64 = 0.1;

// ============================================================================
// API types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

// ============================================================================
// Oracle
// ============================================================================

pub struct GeminiOracle {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiOracle {
    pub fn new(api_key: String, model: &str, timeout: Duration) -> Result<Self, OracleError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            api_key,
            model: model.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

impl MatchOracle for GeminiOracle {
    fn matches(&self, request: &OracleRequest<'_>) -> Result<String, OracleError> {
        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: [Part {
                    text: &request.system_prompt,
                }],
            },
            contents: [Content {
                role: Some("user"),
                parts: [Part {
                    text: &request.user_prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                response_mime_type: "application/json",
            },
        };

        let builder = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body);

        let text = http::send(builder, "gemini")?;
        let response: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| OracleError::InvalidResponse(format!("gemini: {e}")))?;

        let output: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if output.trim().is_empty() {
            return Err(OracleError::InvalidResponse("No candidates in response".to_string()));
        }
        Ok(output)
    }
}

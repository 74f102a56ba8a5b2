//! Matching oracles backed by hosted or local language models.
//!
//! Each oracle sends one comparison unit's prompts and returns the model's
//! raw text. Decoding that text is the engine's job.

mod gemini;
mod http;
mod openai;

pub use gemini::GeminiOracle;
pub use openai::ChatCompletionsOracle;

use std::time::Duration;

use ledgerlink_config::settings::AIProvider;
use ledgerlink_config::ResolvedAIConfig;
use ledgerlink_recon::{MatchOracle, OracleError};

/// Build the oracle for the resolved AI configuration.
pub fn oracle_from_config(config: &ResolvedAIConfig) -> Result<Box<dyn MatchOracle>, OracleError> {
    let timeout = Duration::from_secs(config.timeout_secs.max(1));

    match config.provider {
        AIProvider::None => Err(OracleError::NotConfigured("AI matching is disabled".to_string())),
        AIProvider::OpenAI => {
            let api_key = config.api_key.clone().ok_or(OracleError::MissingKey)?;
            let mut oracle = ChatCompletionsOracle::openai(api_key, &config.model, timeout)?;
            if let Some(base) = &config.endpoint {
                oracle = oracle.with_base_url(base);
            }
            Ok(Box::new(oracle))
        }
        AIProvider::Local => {
            let endpoint = config
                .endpoint
                .as_deref()
                .unwrap_or(ledgerlink_config::settings::DEFAULT_LOCAL_ENDPOINT);
            Ok(Box::new(ChatCompletionsOracle::local(endpoint, &config.model, timeout)?))
        }
        AIProvider::Gemini => {
            let api_key = config.api_key.clone().ok_or(OracleError::MissingKey)?;
            let mut oracle = GeminiOracle::new(api_key, &config.model, timeout)?;
            if let Some(base) = &config.endpoint {
                oracle = oracle.with_base_url(base);
            }
            Ok(Box::new(oracle))
        }
    }
}

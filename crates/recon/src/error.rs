use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (zero window, zero pool, etc.).
    ConfigValidation(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

/// Failure of a single oracle round-trip.
///
/// The dispatcher never propagates these: a failed call only means the unit
/// contributes nothing to the merge.
#[derive(Debug, Clone)]
pub enum OracleError {
    /// Provider disabled or not set up
    NotConfigured(String),
    /// API key missing
    MissingKey,
    /// Transport failure (connect, timeout, TLS)
    Network(String),
    /// Non-2xx response from the provider
    Api { status: u16, message: String },
    /// Provider answered but the envelope had no text in it
    InvalidResponse(String),
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured(msg) => write!(f, "oracle not configured: {msg}"),
            Self::MissingKey => write!(f, "API key not configured"),
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Api { status, message } => write!(f, "API error ({status}): {message}"),
            Self::InvalidResponse(msg) => write!(f, "invalid response: {msg}"),
        }
    }
}

impl std::error::Error for OracleError {}

// AI configuration and secrets management
//
// API keys are looked up in:
// 1. System keychain (preferred)
// 2. Environment variables (fallback for CI/headless)
//
// Keys are NEVER stored in settings.json

use std::env;

use crate::settings::{AIProvider, AISettings};

/// Service name for keychain storage
const KEYCHAIN_SERVICE: &str = "ledgerlink";

/// Source of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Key retrieved from system keychain
    Keychain,
    /// Key retrieved from environment variable
    Environment,
    /// No key found
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Keychain => "keychain",
            KeySource::Environment => "environment",
            KeySource::None => "none",
        }
    }
}

/// Result of key lookup
#[derive(Debug, Clone)]
pub struct KeyLookup {
    pub key: Option<String>,
    pub source: KeySource,
}

/// Get the environment variable name for a provider
pub fn env_var_name(provider: &str) -> String {
    format!("LEDGERLINK_{}_KEY", provider.to_uppercase())
}

/// Get the keychain account name for a provider
fn keychain_account(provider: &str) -> String {
    format!("ai/{}", provider.to_lowercase())
}

/// Get an API key for the specified provider
///
/// Checks in order:
/// 1. System keychain
/// 2. Environment variable (LEDGERLINK_GEMINI_KEY, etc.)
pub fn get_api_key(provider: &str) -> KeyLookup {
    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, &keychain_account(provider)) {
            if let Ok(key) = entry.get_password() {
                return KeyLookup {
                    key: Some(key),
                    source: KeySource::Keychain,
                };
            }
        }
    }

    let env_name = env_var_name(provider);
    if let Ok(key) = env::var(&env_name) {
        if !key.is_empty() {
            return KeyLookup {
                key: Some(key),
                source: KeySource::Environment,
            };
        }
    }

    KeyLookup {
        key: None,
        source: KeySource::None,
    }
}

/// Store an API key in the system keychain
#[cfg(feature = "keychain")]
pub fn set_api_key(provider: &str, key: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, &keychain_account(provider))
        .map_err(|e| format!("Failed to create keychain entry: {}", e))?;

    entry
        .set_password(key)
        .map_err(|e| format!("Failed to store key in keychain: {}", e))
}

#[cfg(not(feature = "keychain"))]
pub fn set_api_key(_provider: &str, _key: &str) -> Result<(), String> {
    Err("Keychain support not enabled. Set LEDGERLINK_<PROVIDER>_KEY environment variable instead.".to_string())
}

/// Check if keychain support is available
pub fn keychain_available() -> bool {
    #[cfg(feature = "keychain")]
    {
        keyring::Entry::new(KEYCHAIN_SERVICE, "probe").is_ok()
    }
    #[cfg(not(feature = "keychain"))]
    {
        false
    }
}

// ============================================================================
// Resolved AI Configuration
// ============================================================================

/// The effective AI configuration, fully resolved from settings, keychain
/// and environment. Oracles are built from this, never from raw settings.
#[derive(Debug, Clone)]
pub struct ResolvedAIConfig {
    pub provider: AIProvider,
    /// Effective model (resolved from settings or provider default)
    pub model: String,
    /// Local: Ollama URL (with default). Others: API base override, if set.
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    /// API key (if available and provider needs one)
    pub api_key: Option<String>,
    pub key_source: KeySource,
    pub status: AIConfigStatus,
    /// Human-readable reason if not ready
    pub blocking_reason: Option<String>,
}

/// Status of the AI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AIConfigStatus {
    /// AI is disabled (provider = None)
    Disabled,
    /// Configuration is valid
    Ready,
    /// Provider is configured but API key is missing
    MissingKey,
}

impl AIConfigStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Ready => "ready",
            Self::MissingKey => "missing_key",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl ResolvedAIConfig {
    /// Resolve the effective AI configuration from settings.
    pub fn from_settings(settings: &AISettings) -> Self {
        Self::resolve(settings, get_api_key)
    }

    /// Resolution with an injectable key lookup.
    fn resolve(settings: &AISettings, lookup_key: impl Fn(&str) -> KeyLookup) -> Self {
        let provider = settings.provider;

        if !provider.is_enabled() {
            return Self {
                provider,
                model: String::new(),
                endpoint: None,
                timeout_secs: settings.timeout_secs,
                api_key: None,
                key_source: KeySource::None,
                status: AIConfigStatus::Disabled,
                blocking_reason: Some("AI matching is disabled (provider = none)".to_string()),
            };
        }

        let model = settings.effective_model().to_string();

        let endpoint = if matches!(provider, AIProvider::Local) {
            Some(settings.effective_endpoint().to_string())
        } else {
            settings.endpoint.clone()
        };

        let (api_key, key_source, key_reason) = if provider.needs_api_key() {
            let lookup = lookup_key(provider.name());
            match lookup.key {
                Some(key) => (Some(key), lookup.source, None),
                None => (
                    None,
                    KeySource::None,
                    Some(format!(
                        "No API key found. Set via keychain or {}",
                        env_var_name(provider.name())
                    )),
                ),
            }
        } else {
            (None, KeySource::None, None)
        };

        let (status, blocking_reason) = match key_reason {
            Some(reason) => (AIConfigStatus::MissingKey, Some(reason)),
            None => (AIConfigStatus::Ready, None),
        };

        Self {
            provider,
            model,
            endpoint,
            timeout_secs: settings.timeout_secs,
            api_key,
            key_source,
            status,
            blocking_reason,
        }
    }

    /// Load settings and resolve in one call
    pub fn load() -> Self {
        let settings = crate::settings::Settings::load();
        Self::from_settings(&settings.ai)
    }

    /// Provider display name
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }
}

// ============================================================================
// Diagnostics (for CLI doctor and debugging)
// ============================================================================

/// Diagnostic information about AI configuration
#[derive(Debug)]
pub struct AIDiagnostics {
    pub provider: String,
    pub model: String,
    pub status: AIConfigStatus,
    pub key_present: bool,
    pub key_source: KeySource,
    pub keychain_available: bool,
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    pub blocking_reason: Option<String>,
    pub settings_path: String,
}

impl AIDiagnostics {
    pub fn from_resolved(config: &ResolvedAIConfig) -> Self {
        Self {
            provider: config.provider.name().to_string(),
            model: config.model.clone(),
            status: config.status,
            key_present: config.api_key.is_some(),
            key_source: config.key_source,
            keychain_available: keychain_available(),
            endpoint: config.endpoint.clone(),
            timeout_secs: config.timeout_secs,
            blocking_reason: config.blocking_reason.clone(),
            settings_path: crate::settings::Settings::config_path_display(),
        }
    }
}

impl std::fmt::Display for AIDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "AI Configuration")?;
        writeln!(f, "──────────────────────────────")?;
        writeln!(f, "Provider:          {}", self.provider)?;
        writeln!(f, "Status:            {}", self.status.as_str())?;
        writeln!(f, "Model:             {}", self.model)?;
        writeln!(f, "Key present:       {}", if self.key_present { "yes" } else { "no" })?;
        writeln!(f, "Key source:        {}", self.key_source.as_str())?;
        writeln!(f, "Keychain available:{}", if self.keychain_available { "yes" } else { "no" })?;
        if let Some(endpoint) = &self.endpoint {
            writeln!(f, "Endpoint:          {}", endpoint)?;
        }
        writeln!(f, "Timeout:           {}s", self.timeout_secs)?;
        writeln!(f, "Settings file:     {}", self.settings_path)?;
        if let Some(reason) = &self.blocking_reason {
            writeln!(f, "Blocking:          {}", reason)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_key(_: &str) -> KeyLookup {
        KeyLookup {
            key: None,
            source: KeySource::None,
        }
    }

    fn env_key(_: &str) -> KeyLookup {
        KeyLookup {
            key: Some("sk-test".into()),
            source: KeySource::Environment,
        }
    }

    fn settings(provider: AIProvider) -> AISettings {
        AISettings {
            provider,
            ..Default::default()
        }
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(env_var_name("openai"), "LEDGERLINK_OPENAI_KEY");
        assert_eq!(env_var_name("Gemini"), "LEDGERLINK_GEMINI_KEY");
    }

    #[test]
    fn test_keychain_account() {
        assert_eq!(keychain_account("OpenAI"), "ai/openai");
    }

    #[test]
    fn test_key_lookup_from_env() {
        env::set_var("LEDGERLINK_TESTPROVIDER_KEY", "test-key-123");

        let lookup = get_api_key("testprovider");
        assert_eq!(lookup.key, Some("test-key-123".to_string()));

        env::remove_var("LEDGERLINK_TESTPROVIDER_KEY");
    }

    #[test]
    fn test_key_lookup_missing() {
        let lookup = get_api_key("nonexistent_provider_xyz");
        assert_eq!(lookup.source, KeySource::None);
        assert!(lookup.key.is_none());
    }

    #[test]
    fn disabled() {
        let config = ResolvedAIConfig::resolve(&settings(AIProvider::None), env_key);
        assert_eq!(config.status, AIConfigStatus::Disabled);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn gemini_ready_with_key() {
        let config = ResolvedAIConfig::resolve(&settings(AIProvider::Gemini), env_key);
        assert_eq!(config.status, AIConfigStatus::Ready);
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.key_source, KeySource::Environment);
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn missing_key_names_env_var() {
        let config = ResolvedAIConfig::resolve(&settings(AIProvider::OpenAI), no_key);
        assert_eq!(config.status, AIConfigStatus::MissingKey);
        assert!(config.blocking_reason.unwrap().contains("LEDGERLINK_OPENAI_KEY"));
    }

    #[test]
    fn local_needs_no_key() {
        let config = ResolvedAIConfig::resolve(&settings(AIProvider::Local), no_key);
        assert_eq!(config.status, AIConfigStatus::Ready);
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:11434"));
    }
}

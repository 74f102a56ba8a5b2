// Application settings
// Loaded from ~/.config/ledgerlink/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use ledgerlink_recon::EngineConfig;

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LOCAL_ENDPOINT: &str = "http://localhost:11434";

/// AI provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AIProvider {
    /// Matching disabled
    None,
    /// Local model via Ollama
    Local,
    /// OpenAI API
    #[serde(rename = "openai")]
    OpenAI,
    /// Google Gemini API
    #[default]
    Gemini,
}

impl AIProvider {
    /// Returns true if AI features are enabled
    pub fn is_enabled(&self) -> bool {
        !matches!(self, AIProvider::None)
    }

    /// Local models run without credentials
    pub fn needs_api_key(&self) -> bool {
        matches!(self, AIProvider::OpenAI | AIProvider::Gemini)
    }

    /// Lowercase name, as used in settings, env vars and keychain accounts
    pub fn name(&self) -> &'static str {
        match self {
            AIProvider::None => "none",
            AIProvider::Local => "local",
            AIProvider::OpenAI => "openai",
            AIProvider::Gemini => "gemini",
        }
    }

    /// Returns the default model for this provider
    pub fn default_model(&self) -> &'static str {
        match self {
            AIProvider::None => "",
            AIProvider::Local => "llama3:8b",
            AIProvider::OpenAI => "gpt-4o",
            AIProvider::Gemini => "gemini-1.5-flash",
        }
    }
}

impl std::fmt::Display for AIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// AI-specific settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AISettings {
    /// Selected AI provider
    pub provider: AIProvider,

    /// Model identifier (provider-specific, empty = provider default)
    pub model: String,

    /// Custom endpoint. Ollama URL for Local, API base URL otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Per-request timeout for oracle calls
    pub timeout_secs: u64,
}

impl Default for AISettings {
    fn default() -> Self {
        Self {
            provider: AIProvider::default(),
            model: String::new(),
            endpoint: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AISettings {
    /// Get the effective model (user-specified or provider default)
    pub fn effective_model(&self) -> &str {
        if self.model.is_empty() {
            self.provider.default_model()
        } else {
            &self.model
        }
    }

    /// Get the effective endpoint for Local provider
    pub fn effective_endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_LOCAL_ENDPOINT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ai: AISettings,
    pub recon: EngineConfig,
}

const DEFAULT_SETTINGS_FILE: &str = r#"{
    // AI matching oracle
    // Provider options: "none", "local", "openai", "gemini"
    // API keys are stored in the system keychain or LEDGERLINK_<PROVIDER>_KEY,
    // never in this file
    "ai": {
        "provider": "gemini",
        "model": "",
        "timeout_secs": 120
    },

    // Reconciliation engine
    // window_size: records of the bigger file per AI call
    // pool_size: AI calls in flight at once
    // date_window_days: allowed date difference between matched entries
    // duplicate_matches: "keep_all" or "first_reported"
    "recon": {
        "window_size": 20,
        "pool_size": 3,
        "date_window_days": 3,
        "duplicate_matches": "keep_all"
    }
}
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        crate::paths::config_dir().join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            Self::create_default_file(&path);
            return Self::default();
        }

        Self::load_from(&path)
    }

    /// Load from an explicit path. Unreadable or malformed files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("error parsing {}: {e}; using default settings", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("error reading {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Parse settings JSON, ignoring whole-line `//` comments.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        serde_json::from_str(&cleaned)
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<(), String> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Create default settings file with comments
    fn create_default_file(path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("error creating config directory: {e}");
                return;
            }
        }

        if let Err(e) = fs::write(path, DEFAULT_SETTINGS_FILE) {
            log::warn!("error writing default settings.json: {e}");
        }
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

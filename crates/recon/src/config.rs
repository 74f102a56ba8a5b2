use serde::{Deserialize, Serialize};

use crate::dispatch::DEFAULT_POOL_SIZE;
use crate::error::ReconError;
use crate::oracle::DEFAULT_DATE_WINDOW_DAYS;
use crate::plan::DEFAULT_WINDOW_SIZE;

// ---------------------------------------------------------------------------
// Engine config
// ---------------------------------------------------------------------------

/// Tunables for one reconciliation run.
///
/// Loadable from a standalone TOML file or embedded in `settings.json`
/// under `recon`. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Records of the bigger dataset per oracle call.
    pub window_size: usize,
    /// Maximum oracle calls in flight.
    pub pool_size: usize,
    /// Allowed date gap (days, inclusive) communicated to the oracle.
    pub date_window_days: u32,
    pub duplicate_matches: DuplicateMatches,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            pool_size: DEFAULT_POOL_SIZE,
            date_window_days: DEFAULT_DATE_WINDOW_DAYS,
            duplicate_matches: DuplicateMatches::default(),
        }
    }
}

/// What to do when two units report the same (A, B) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateMatches {
    /// Append every reported match.
    #[default]
    KeepAll,
    /// Keep the first report of each pair, drop later repeats.
    FirstReported,
}

impl std::fmt::Display for DuplicateMatches {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeepAll => write!(f, "keep_all"),
            Self::FirstReported => write!(f, "first_reported"),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl EngineConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: EngineConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.window_size == 0 {
            return Err(ReconError::ConfigValidation(
                "window_size must be at least 1".into(),
            ));
        }
        if self.pool_size == 0 {
            return Err(ReconError::ConfigValidation(
                "pool_size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

//! CLI Exit Code Registry
//!
//! Single source of truth for `ledgerlink` exit codes. Scripts rely on
//! these, so existing values never change meaning.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | General error                                            |
//! | 2    | Usage error (bad arguments, invalid engine settings)     |
//! | 3    | Input file could not be read or parsed                   |
//! | 10   | AI disabled or provider not implemented                  |
//! | 11   | AI provider configured but API key missing               |
//! | 20   | Not authenticated (no token, expired or revoked session) |
//! | 21   | Account error (signup validation, bad credentials)       |
//! | 30   | Local store error                                        |
//! | 40   | Units were planned but none reconciled                   |

use ledgerlink_recon::{OracleError, ReconError};
use ledgerlink_store::StoreError;

use crate::CliError;

// =============================================================================
// Universal (0-3)
// =============================================================================

pub const EXIT_SUCCESS: u8 = 0;

/// Unspecified failure. Prefer a specific code.
pub const EXIT_ERROR: u8 = 1;

pub const EXIT_USAGE: u8 = 2;

/// Input file missing, unsupported, or unparseable.
pub const EXIT_INGEST: u8 = 3;

// =============================================================================
// AI (10-19)
// =============================================================================

/// provider = none, or a provider with no client yet.
pub const EXIT_AI_DISABLED: u8 = 10;

pub const EXIT_AI_MISSING_KEY: u8 = 11;

// =============================================================================
// Accounts (20-29)
// =============================================================================

pub const EXIT_NOT_AUTH: u8 = 20;

pub const EXIT_ACCOUNT: u8 = 21;

// =============================================================================
// Store (30-39)
// =============================================================================

pub const EXIT_STORE: u8 = 30;

// =============================================================================
// Reconciliation (40-49)
// =============================================================================

/// Every planned unit failed or returned nothing usable. Partial output
/// is still printed and saved.
pub const EXIT_NOTHING_RECONCILED: u8 = 40;

// =============================================================================
// Error mapping
// =============================================================================

pub fn store_error(err: StoreError) -> CliError {
    match err {
        StoreError::SessionInvalid => CliError {
            code: EXIT_NOT_AUTH,
            message: err.to_string(),
            hint: Some("run `ledgerlink login`".to_string()),
        },
        e if e.is_account_error() => CliError {
            code: EXIT_ACCOUNT,
            message: e.to_string(),
            hint: None,
        },
        e => CliError {
            code: EXIT_STORE,
            message: e.to_string(),
            hint: Some(format!(
                "check the database at {}",
                ledgerlink_store::Store::default_path().display()
            )),
        },
    }
}

pub fn oracle_error(err: OracleError) -> CliError {
    let settings = ledgerlink_config::Settings::config_path_display();
    match err {
        OracleError::NotConfigured(_) => CliError {
            code: EXIT_AI_DISABLED,
            message: err.to_string(),
            hint: Some(format!("set ai.provider in {}", settings)),
        },
        OracleError::MissingKey => CliError {
            code: EXIT_AI_MISSING_KEY,
            message: err.to_string(),
            hint: Some("run `ledgerlink ai doctor` for the variable to set".to_string()),
        },
        other => CliError {
            code: EXIT_ERROR,
            message: other.to_string(),
            hint: None,
        },
    }
}

pub fn recon_error(err: ReconError) -> CliError {
    CliError {
        code: EXIT_USAGE,
        message: err.to_string(),
        hint: Some("check --window/--pool and the recon section of settings.json".to_string()),
    }
}

//! `ledgerlink ai doctor`

use ledgerlink_config::{AIConfigStatus, AIDiagnostics, ResolvedAIConfig};

use crate::exit_codes::*;
use crate::{print_json, CliError};

pub fn cmd_ai_doctor(json: bool) -> Result<(), CliError> {
    let config = ResolvedAIConfig::load();
    let diag = AIDiagnostics::from_resolved(&config);

    if json {
        print_json(&serde_json::json!({
            "schema_version": 1,
            "status": diag.status.as_str(),
            "blocking_reason": diag.blocking_reason,
            "provider": diag.provider,
            "model": diag.model,
            "key": if diag.key_present { "present" } else { "missing" },
            "key_source": diag.key_source.as_str(),
            "keychain": if diag.keychain_available { "ok" } else { "unavailable" },
            "endpoint": diag.endpoint,
            "timeout_secs": diag.timeout_secs,
            "settings_path": diag.settings_path,
        }))?;
    } else {
        print!("{}", diag);

        match diag.status {
            AIConfigStatus::Disabled => {
                println!();
                println!("AI matching is disabled. To enable:");
                println!("  Set ai.provider in {}", diag.settings_path);
            }
            AIConfigStatus::MissingKey => {
                println!();
                println!(
                    "Fix: set {} or store the key in the keychain",
                    ledgerlink_config::ai::env_var_name(&diag.provider)
                );
            }
            AIConfigStatus::Ready => {}
        }
    }

    match diag.status {
        AIConfigStatus::Ready => Ok(()),
        AIConfigStatus::Disabled => Err(CliError {
            code: EXIT_AI_DISABLED,
            message: diag
                .blocking_reason
                .unwrap_or_else(|| "AI matching is unavailable".to_string()),
            hint: None,
        }),
        AIConfigStatus::MissingKey => Err(CliError {
            code: EXIT_AI_MISSING_KEY,
            message: diag
                .blocking_reason
                .unwrap_or_else(|| "API key missing".to_string()),
            hint: None,
        }),
    }
}

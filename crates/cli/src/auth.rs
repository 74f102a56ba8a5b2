//! Session token storage.
//!
//! Reads/writes <config_dir>/auth.json (0600 on Unix). `LEDGERLINK_TOKEN`
//! takes precedence over the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const TOKEN_ENV: &str = "LEDGERLINK_TOKEN";

/// What `ledgerlink login` leaves behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSession {
    pub token: String,
    /// For display only; the store is authoritative.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

pub fn auth_file_path() -> PathBuf {
    ledgerlink_config::paths::config_dir().join("auth.json")
}

/// Token for this invocation: env var first, then the saved session.
pub fn current_token() -> Option<String> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            return Some(token.trim().to_string());
        }
    }
    load_from(&auth_file_path()).map(|s| s.token)
}

pub fn load() -> Option<SavedSession> {
    load_from(&auth_file_path())
}

fn load_from(path: &Path) -> Option<SavedSession> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(session) => Some(session),
        Err(e) => {
            log::warn!("ignoring unreadable {}: {}", path.display(), e);
            None
        }
    }
}

pub fn save(session: &SavedSession) -> Result<(), String> {
    save_to(&auth_file_path(), session)
}

fn save_to(path: &Path, session: &SavedSession) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }

    let contents = serde_json::to_string_pretty(session)
        .map_err(|e| format!("Failed to serialize session: {}", e))?;

    std::fs::write(path, contents).map_err(|e| format!("Failed to write auth file: {}", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| format!("Failed to set file permissions: {}", e))?;
    }

    Ok(())
}

/// Remove the saved session. A missing file is fine.
pub fn delete() -> Result<(), String> {
    let path = auth_file_path();
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(format!("Failed to delete auth file: {}", e)),
    }
}

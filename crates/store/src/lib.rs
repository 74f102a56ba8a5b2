//! Local persistence for LedgerLink: accounts, sessions and the
//! reconciliation history, in a single SQLite file.

mod accounts;
mod error;
mod history;
mod password;

pub use accounts::{Account, Session, MIN_PASSWORD_LEN, SESSION_DAYS};
pub use error::StoreError;
pub use history::{ReconciliationRecord, StoredReconciliation};

use std::path::{Path, PathBuf};

use rusqlite::Connection;

const DB_FILE: &str = "ledgerlink.db";

const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,        -- stored lowercased
    full_name TEXT NOT NULL,
    password_hash TEXT NOT NULL,       -- bcrypt, salt embedded
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS reconciliations (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,          -- RFC 3339, microseconds, UTC
    dataset_a TEXT NOT NULL,           -- JSON array of records
    dataset_b TEXT NOT NULL,
    result TEXT NOT NULL               -- JSON ReconReport
);

CREATE INDEX IF NOT EXISTS idx_reconciliations_user
    ON reconciliations (user_id, created_at);
"#;

pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        log::debug!("opened store at {}", path.display());

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Open the per-user database under the platform data directory.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(&Self::default_path())
    }

    pub fn default_path() -> PathBuf {
        ledgerlink_config::paths::data_dir().join(DB_FILE)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Sortable UTC timestamp used for every stored time.
pub(crate) fn timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

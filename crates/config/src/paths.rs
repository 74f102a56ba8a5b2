// Per-user directories
//
// Config: settings.json, auth.json   (~/.config/ledgerlink)
// Data:   ledgerlink.db              (~/.local/share/ledgerlink)

use std::env;
use std::path::PathBuf;

pub const CONFIG_DIR_ENV: &str = "LEDGERLINK_CONFIG_DIR";
pub const DATA_DIR_ENV: &str = "LEDGERLINK_DATA_DIR";

const APP_DIR: &str = "ledgerlink";

pub fn config_dir() -> PathBuf {
    dir_from_env(CONFIG_DIR_ENV).unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    })
}

pub fn data_dir() -> PathBuf {
    dir_from_env(DATA_DIR_ENV).unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    })
}

fn dir_from_env(name: &str) -> Option<PathBuf> {
    env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

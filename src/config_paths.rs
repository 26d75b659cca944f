//! Centralized configuration paths for keyconfig-builder
//!
//! All config files live under:
//! - Unix/macOS: `~/.config/keyconfig-builder/`
//! - Windows: `%APPDATA%\keyconfig-builder\`
//!
//! This module is the single source of truth for config paths.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

const APP_DIR: &str = "keyconfig-builder";

/// File name prefix used by the daily-rolling log appender
pub const LOG_FILE_PREFIX: &str = "keyconfig-builder.log";

/// Base config directory for keyconfig-builder
///
/// Unix/macOS:
///   - If XDG_CONFIG_HOME is set: `$XDG_CONFIG_HOME/keyconfig-builder`
///   - Else: `~/.config/keyconfig-builder`
///
/// Windows:
///   - `%APPDATA%\keyconfig-builder`
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_DIR))
    }

    #[cfg(not(target_os = "windows"))]
    {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|config| config.join(APP_DIR))
    }
}

/// `~/.config/keyconfig-builder/config.yaml`
pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.yaml"))
}

/// `~/.config/keyconfig-builder/keyconfig_rules.yaml`
pub fn rules_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("keyconfig_rules.yaml"))
}

/// `~/.config/keyconfig-builder/presets/`
pub fn presets_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("presets"))
}

/// `~/.config/keyconfig-builder/userpref.json`
pub fn userpref_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("userpref.json"))
}

/// `~/.config/keyconfig-builder/logs/`
pub fn logs_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("logs"))
}

pub fn ensure_dir(path: &Path) -> Result<(), String> {
    fs::create_dir_all(path)
        .map_err(|e| format!("Failed to create directory {}: {}", path.display(), e))
}

/// Ensure the base config dir exists, returning it
pub fn ensure_config_dir() -> Result<PathBuf, String> {
    let dir = config_dir().ok_or_else(|| "No config directory available".to_string())?;
    ensure_dir(&dir)?;
    Ok(dir)
}

/// Ensure logs dir exists, returning it
pub fn ensure_logs_dir() -> Result<PathBuf, String> {
    let config = ensure_config_dir()?;
    let logs = config.join("logs");
    ensure_dir(&logs)?;
    Ok(logs)
}

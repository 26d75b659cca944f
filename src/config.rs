//! Builder configuration persistence
//!
//! Stores settings in `~/.config/keyconfig-builder/config.yaml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Builder configuration that persists across runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Name of the keyconfig to build; falls back to the rule file's name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyconfig_name: Option<String>,

    /// Base keyconfig snapshot; the embedded factory snapshot when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_keyconfig: Option<PathBuf>,

    /// Extra rules file layered on top of the default rules
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_file: Option<PathBuf>,

    /// Where exports are written (`<presets>/keyconfig/...`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presets_dir: Option<PathBuf>,

    /// Where the live table is saved as preferences
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userpref_file: Option<PathBuf>,

    /// External add-ons whose integration rules should run
    #[serde(default = "default_integrations")]
    pub enabled_integrations: Vec<String>,
}

fn default_integrations() -> Vec<String> {
    vec!["node_wrangler".to_string()]
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            keyconfig_name: None,
            base_keyconfig: None,
            rules_file: None,
            presets_dir: None,
            userpref_file: None,
            enabled_integrations: default_integrations(),
        }
    }
}

impl BuilderConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };

        Self::load_from(&path)
    }

    /// Load config from a specific file, or return defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<(), String> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| "No config directory available".to_string())?;
        self.save_to(&path)
    }

    /// Save config to a specific file
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn is_integration_enabled(&self, addon: &str) -> bool {
        self.enabled_integrations.iter().any(|name| name == addon)
    }

    /// Resolved presets directory (configured, else the config-dir default)
    pub fn presets_dir(&self) -> Option<PathBuf> {
        self.presets_dir
            .clone()
            .or_else(crate::config_paths::presets_dir)
    }

    /// Resolved preferences file (configured, else the config-dir default)
    pub fn userpref_file(&self) -> Option<PathBuf> {
        self.userpref_file
            .clone()
            .or_else(crate::config_paths::userpref_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_enables_node_wrangler_only() {
        let config = BuilderConfig::default();
        assert!(config.is_integration_enabled("node_wrangler"));
        assert!(!config.is_integration_enabled("mesh_f2"));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: BuilderConfig = serde_yaml::from_str("keyconfig_name: Mine\n").unwrap();
        assert_eq!(config.keyconfig_name.as_deref(), Some("Mine"));
        assert_eq!(config.enabled_integrations, default_integrations());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let config = BuilderConfig {
            keyconfig_name: Some("Studio".to_string()),
            presets_dir: Some(dir.path().join("presets")),
            enabled_integrations: vec!["mesh_f2".to_string()],
            ..BuilderConfig::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(BuilderConfig::load_from(&path), config);
    }

    #[test]
    fn test_unparsable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "enabled_integrations: {not: a list}").unwrap();
        assert_eq!(BuilderConfig::load_from(&path), BuilderConfig::default());
    }
}

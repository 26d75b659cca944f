//! Keyconfig file format (YAML)
//!
//! The same format is read for base snapshots and written for exports.
//! Exports list every active record once; inactive records are left out.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::action::{ActionRef, Params};
use super::binding::BindingRecord;
use super::config::KeymapError;
use super::context::{space_type_for, KeyContext};
use super::hotkey::parse_hotkey;
use super::keyconfig::{Keyconfig, KeyconfigKind};

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyconfigFile {
    pub name: String,
    #[serde(default)]
    pub keymaps: Vec<KeymapFile>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeymapFile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_type: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub modal: bool,
    #[serde(default)]
    pub items: Vec<ItemFile>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemFile {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    pub hotkey: String,
    #[serde(default = "default_active", skip_serializing_if = "is_true")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// File form of a table; inactive records are only kept when asked for
pub fn keyconfig_to_file(keyconfig: &Keyconfig, include_inactive: bool) -> KeyconfigFile {
    KeyconfigFile {
        name: keyconfig.name.clone(),
        keymaps: keyconfig
            .contexts
            .iter()
            .map(|context| KeymapFile {
                name: context.name.clone(),
                space_type: Some(context.space_type.clone()),
                region_type: Some(context.region_type.clone()),
                modal: context.is_modal,
                items: context
                    .items
                    .iter()
                    .filter(|r| include_inactive || r.active)
                    .map(|r| ItemFile {
                        action: r.action.id.clone(),
                        params: r.action.params.clone(),
                        hotkey: r.trigger.to_string(),
                        active: r.active,
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Serialize the active records of a keyconfig
pub fn export_keyconfig(keyconfig: &Keyconfig) -> Result<String, KeymapError> {
    serde_yaml::to_string(&keyconfig_to_file(keyconfig, false))
        .map_err(|e| KeymapError::ParseError(e.to_string()))
}

/// `<presets>/keyconfig/<Name_With_Underscores>.yaml`
pub fn export_path(presets_dir: &Path, keyconfig_name: &str) -> PathBuf {
    presets_dir
        .join("keyconfig")
        .join(format!("{}.yaml", keyconfig_name.replace(' ', "_")))
}

/// Parse a keyconfig file into a table of the given kind
///
/// Every record gets a fresh identity.
pub fn parse_keyconfig_yaml(yaml: &str, kind: KeyconfigKind) -> Result<Keyconfig, KeymapError> {
    let file: KeyconfigFile =
        serde_yaml::from_str(yaml).map_err(|e| KeymapError::ParseError(e.to_string()))?;

    let mut keyconfig = Keyconfig::new(file.name, kind);
    for keymap in file.keymaps {
        let mut context = KeyContext::new(keymap.name);
        context.space_type = keymap
            .space_type
            .unwrap_or_else(|| space_type_for(&context.name).to_string());
        if let Some(region_type) = keymap.region_type {
            context.region_type = region_type;
        }
        context.is_modal = keymap.modal;

        for item in keymap.items {
            let trigger = parse_hotkey(&item.hotkey).map_err(|e| {
                KeymapError::ParseError(format!("keymap '{}': {}", context.name, e))
            })?;
            let action = ActionRef {
                id: item.action,
                params: item.params,
            };
            let mut record = BindingRecord::new(action, trigger);
            record.active = item.active;
            context.push(record);
        }
        keyconfig.contexts.push(context);
    }

    Ok(keyconfig)
}

/// Load a keyconfig file from disk
pub fn load_keyconfig_file(path: &Path, kind: KeyconfigKind) -> Result<Keyconfig, KeymapError> {
    let content = std::fs::read_to_string(path).map_err(|e| KeymapError::IoError(e.to_string()))?;

    parse_keyconfig_yaml(&content, kind)
}

//! Default rule set and base snapshot that ship with the builder
//!
//! Project-local (keyconfig_rules.local.yaml) and user config dir rules are
//! layered on top of the embedded copy.

use std::path::Path;

use super::config::{load_rules_file, parse_rules_yaml, KeymapError, RuleSet};
use super::export::parse_keyconfig_yaml;
use super::keyconfig::{Keyconfig, KeyconfigKind};
use crate::config_paths;

/// Default rules YAML embedded at compile time
const DEFAULT_RULES_YAML: &str = include_str!("../../keyconfig_rules.yaml");

/// Factory keyconfig snapshot used when no base file is configured
const DEFAULT_BASE_YAML: &str = include_str!("../../samples/base_keyconfig.yaml");

/// Keyconfig name used when neither the rules nor the config name one
pub const DEFAULT_KEYCONFIG_NAME: &str = "Sugar Keyconfig";

/// Parse the embedded rule set
pub fn default_rules() -> Result<RuleSet, KeymapError> {
    parse_rules_yaml(DEFAULT_RULES_YAML)
}

/// Parse the embedded base snapshot
pub fn default_base_keyconfig() -> Result<Keyconfig, KeymapError> {
    parse_keyconfig_yaml(DEFAULT_BASE_YAML, KeyconfigKind::Default)
}

/// Load and merge rules: defaults + overrides
///
/// Loading order (each layer is merged onto the previous):
/// 1. Embedded default rules (compiled into binary)
/// 2. keyconfig_rules.local.yaml in current directory (project-local rules)
/// 3. User rules at ~/.config/keyconfig-builder/keyconfig_rules.yaml
pub fn load_default_rules() -> RuleSet {
    let mut rules = match default_rules() {
        Ok(r) => {
            tracing::info!(
                "Loaded embedded rules ({} blocks, {} directives)",
                r.blocks.len(),
                r.directive_count()
            );
            r
        }
        Err(e) => {
            tracing::warn!("Failed to parse embedded rules: {}, starting empty", e);
            RuleSet::default()
        }
    };

    let local = Path::new("keyconfig_rules.local.yaml");
    if local.exists() {
        match load_rules_file(local) {
            Ok(local_rules) => {
                tracing::info!(
                    "Merging project keyconfig_rules.local.yaml ({} directives)",
                    local_rules.directive_count()
                );
                rules = merge_rules(rules, local_rules);
            }
            Err(e) => tracing::warn!("Failed to load project rules: {}", e),
        }
    }

    if let Some(user_path) = config_paths::rules_file() {
        if user_path.exists() {
            match load_rules_file(&user_path) {
                Ok(user_rules) => {
                    tracing::info!(
                        "Merging user rules from {} ({} directives)",
                        user_path.display(),
                        user_rules.directive_count()
                    );
                    rules = merge_rules(rules, user_rules);
                }
                Err(e) => {
                    tracing::warn!("Failed to load user rules from {}: {}", user_path.display(), e);
                }
            }
        }
    }

    rules
}

/// Merge an override rule set onto a base rule set
///
/// - Blocks and integrations are appended after the base ones
/// - A sweep or name in the override replaces the base one
/// - Parameter schemas are combined
pub fn merge_rules(base: RuleSet, overrides: RuleSet) -> RuleSet {
    let mut result = base;

    if overrides.name.is_some() {
        result.name = overrides.name;
    }
    if overrides.sweep.is_some() {
        result.sweep = overrides.sweep;
    }
    result.schema.extend(overrides.schema);
    result.blocks.extend(overrides.blocks);
    result.integrations.extend(overrides.integrations);
    result.overlay.extend(overrides.overlay);

    result
}

//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::path::Path;

use keyconfig_builder::config::BuilderConfig;
use keyconfig_builder::keymap::{
    default_base_keyconfig, default_rules, parse_hotkey, parse_keyconfig_yaml, ActionPattern,
    BindingRecord, Keyconfig, KeyconfigKind, RuleSet, Trigger,
};
use keyconfig_builder::{Runtime, Session};

/// Config writing exports and preferences under `dir`
pub fn test_config(dir: &Path, integrations: &[&str]) -> BuilderConfig {
    BuilderConfig {
        presets_dir: Some(dir.join("presets")),
        userpref_file: Some(dir.join("userpref.json")),
        enabled_integrations: integrations.iter().map(|s| s.to_string()).collect(),
        ..BuilderConfig::default()
    }
}

/// Session over the embedded base snapshot and rules
pub fn embedded_session(config: BuilderConfig) -> Session {
    Session::register(
        config,
        default_base_keyconfig().unwrap(),
        default_rules().unwrap(),
    )
}

pub fn embedded_runtime(dir: &Path, integrations: &[&str]) -> Runtime {
    Runtime::new(embedded_session(test_config(dir, integrations)))
}

/// Session over a hand-written snapshot and rules
pub fn session_from_yaml(config: BuilderConfig, base: &str, rules: RuleSet) -> Session {
    Session::register(
        config,
        parse_keyconfig_yaml(base, KeyconfigKind::Default).unwrap(),
        rules,
    )
}

pub fn hotkey(descriptor: &str) -> Trigger {
    parse_hotkey(descriptor).unwrap()
}

/// First record in `context` for `action`, optionally with `descriptor`
pub fn find<'a>(
    keyconfig: &'a Keyconfig,
    context: &str,
    action: &str,
    descriptor: Option<&str>,
) -> Option<&'a BindingRecord> {
    let trigger = descriptor.map(hotkey);
    keyconfig.find_first(context, &ActionPattern::id(action), trigger.as_ref())
}

/// Active records of `action` in `context`
pub fn active_count(keyconfig: &Keyconfig, context: &str, action: &str) -> usize {
    keyconfig
        .context(context)
        .map_or(0, |c| {
            c.items
                .iter()
                .filter(|r| r.active && r.action.id == action)
                .count()
        })
}

//! Keyconfig rule compiler and reconciliation engine
//!
//! This module turns a declarative rule list into a consistent table of
//! active key bindings:
//! - Parses compact hotkey descriptors (`"D ctrl alt DOUBLE_CLICK"`)
//! - Matches binding records against action/trigger patterns
//! - Applies ADD / DISABLE / EDIT directives with disable-before-add ordering
//! - Loads rules from YAML and reads/writes keyconfig files
//!
//! # Architecture
//!
//! ```text
//! keyconfig_rules.yaml → RuleSet → engine::apply() → Keyconfig → export
//! ```
//!
//! # Loading Rules
//!
//! ```ignore
//! // Embedded defaults layered with project and user overrides
//! let rules = load_default_rules();
//!
//! // Or a specific file
//! let rules = load_rules_file(Path::new("keyconfig_rules.yaml"))?;
//! ```

mod action;
mod binding;
mod config;
mod context;
mod defaults;
mod engine;
mod export;
mod hotkey;
mod keyconfig;
mod matcher;
mod store;
mod types;

pub use action::{ActionPattern, ActionRef, ParamSchema, ParamSetter, ParamValue, Params};
pub use binding::{BindingId, BindingRecord};
pub use config::{
    compile_rule, load_rules_file, parse_rules_yaml, IntegrationBlock, KeymapError, RuleBlock,
    RuleConfig, RuleSet,
};
pub use context::{space_type_for, KeyContext};
pub use defaults::{
    default_base_keyconfig, default_rules, load_default_rules, merge_rules,
    DEFAULT_KEYCONFIG_NAME,
};
pub use engine::{
    apply, apply_all, edit_trigger, sweep, AddDirective, ApplyReport, Directive, DirectiveOutcome,
    DisableDirective, EditDirective, EditTarget, Replace, SweepSpec,
};
pub use export::{
    export_keyconfig, export_path, keyconfig_to_file, load_keyconfig_file, parse_keyconfig_yaml,
    KeyconfigFile,
};
pub use hotkey::{parse_hotkey, HotkeySpec};
pub use keyconfig::{ContextPattern, Keyconfig, KeyconfigKind};
pub use matcher::{action_matches, record_matches, trigger_matches};
pub use store::{KeyconfigStore, TableRef, ADDON_KEYCONFIG_NAME, USER_KEYCONFIG_NAME};
pub use types::{InputValue, Modifiers, Trigger};

#[cfg(test)]
mod tests;

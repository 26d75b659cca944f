//! YAML configuration parsing for keyconfig rules
//!
//! Parses keyconfig_rules.yaml files into compiled [`Directive`]s. Every
//! hotkey, action and setter is validated here so that a malformed rule
//! fails at load time rather than halfway through a rebuild.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::action::{ActionPattern, ActionRef, ParamSchema, ParamSetter, ParamValue, Params};
use super::engine::{
    AddDirective, ContextPattern, Directive, DisableDirective, EditDirective, EditTarget, Replace,
    SweepSpec,
};
use super::hotkey::HotkeySpec;
use super::types::Trigger;

/// Root structure of a rules YAML file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulesConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sweep: Option<SweepConfig>,
    #[serde(default)]
    pub schemas: ParamSchema,
    #[serde(default)]
    pub blocks: Vec<BlockConfig>,
    #[serde(default)]
    pub integrations: Vec<IntegrationConfig>,
    /// Add-on bindings registered with the session, same shape as `add`
    #[serde(default)]
    pub overlay: Vec<AddConfig>,
}

/// Bulk-disable sweep run once before the rule blocks
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    pub include: Vec<String>,
    #[serde(default)]
    pub exceptions: Vec<String>,
}

/// One functional area's ordered rules
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockConfig {
    pub name: String,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// Rules applied to the live table only when `addon` is enabled
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntegrationConfig {
    pub addon: String,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// A single rule entry: exactly one of `add`, `disable`, `edit`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    #[serde(default)]
    pub add: Option<AddConfig>,
    #[serde(default)]
    pub disable: Option<DisableConfig>,
    #[serde(default)]
    pub edit: Option<EditConfig>,
}

/// `action: wm.call_menu`, `action: {wm.call_menu: {name: X}}` or
/// `action: {wm.call_menu: false}` (exactly no parameters)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ActionConfig {
    Id(String),
    WithParams(BTreeMap<String, ActionParamsConfig>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ActionParamsConfig {
    NoParams(bool),
    Params(Params),
}

/// `disable_old: true`, a hotkey, or a list of hotkeys
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DisableOldConfig {
    Flag(bool),
    Many(Vec<HotkeySpec>),
    One(HotkeySpec),
}

/// One hotkey or a list of them
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum HotkeyListConfig {
    Many(Vec<HotkeySpec>),
    One(HotkeySpec),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddConfig {
    pub keymap: String,
    pub action: ActionConfig,
    pub hotkey: HotkeySpec,
    #[serde(default)]
    pub disable_old: Option<DisableOldConfig>,
    #[serde(default)]
    pub disable_old_exact_params: Option<HotkeyListConfig>,
    /// Named setters, applied in file order
    #[serde(default)]
    pub set: serde_yaml::Mapping,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisableConfig {
    pub keymap: String,
    pub action: ActionConfig,
    #[serde(default)]
    pub hotkey: Option<HotkeySpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditConfig {
    pub keymap: String,
    pub action: ActionConfig,
    pub hotkey: HotkeySpec,
    #[serde(default)]
    pub old_hotkey: Option<HotkeySpec>,
    #[serde(default)]
    pub old_hotkey_exact_params: Option<HotkeySpec>,
}

/// A named, ordered list of compiled directives
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBlock {
    pub name: String,
    pub directives: Vec<Directive>,
}

/// Directives gated on an external add-on being enabled
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationBlock {
    pub addon: String,
    pub directives: Vec<Directive>,
}

/// A fully validated rule file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    pub name: Option<String>,
    pub sweep: Option<SweepSpec>,
    pub schema: ParamSchema,
    pub blocks: Vec<RuleBlock>,
    pub integrations: Vec<IntegrationBlock>,
    /// Bindings the session adds to the add-on table at registration
    pub overlay: Vec<AddDirective>,
}

impl RuleSet {
    /// Number of directives across all blocks (integrations excluded)
    pub fn directive_count(&self) -> usize {
        self.blocks.iter().map(|b| b.directives.len()).sum()
    }

    pub fn integration_directive_count(&self) -> usize {
        self.integrations.iter().map(|b| b.directives.len()).sum()
    }
}

/// Load rules from a YAML file
pub fn load_rules_file(path: &Path) -> Result<RuleSet, KeymapError> {
    let content = std::fs::read_to_string(path).map_err(|e| KeymapError::IoError(e.to_string()))?;

    parse_rules_yaml(&content)
}

/// Parse rules from YAML string
pub fn parse_rules_yaml(yaml: &str) -> Result<RuleSet, KeymapError> {
    let config: RulesConfig =
        serde_yaml::from_str(yaml).map_err(|e| KeymapError::ParseError(e.to_string()))?;

    let sweep = config
        .sweep
        .map(|s| SweepSpec::new(s.include, s.exceptions));

    let mut blocks = Vec::with_capacity(config.blocks.len());
    for block in config.blocks {
        let directives = compile_rules(&block.name, block.rules)?;
        if directives.iter().any(|d| matches!(d, Directive::Edit(_))) {
            return Err(KeymapError::InvalidRule(format!(
                "block `{}`: edit rules only apply to the user keyconfig, move them to an integration",
                block.name
            )));
        }
        blocks.push(RuleBlock {
            name: block.name,
            directives,
        });
    }

    let mut integrations = Vec::with_capacity(config.integrations.len());
    for integration in config.integrations {
        let directives = compile_rules(&integration.addon, integration.rules)?;
        integrations.push(IntegrationBlock {
            addon: integration.addon,
            directives,
        });
    }

    let overlay = config
        .overlay
        .into_iter()
        .enumerate()
        .map(|(index, add)| {
            compile_add(add).map_err(|e| {
                KeymapError::InvalidRule(format!("overlay rule #{}: {}", index + 1, e))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RuleSet {
        name: config.name,
        sweep,
        schema: config.schemas,
        blocks,
        integrations,
        overlay,
    })
}

fn compile_rules(block: &str, rules: Vec<RuleConfig>) -> Result<Vec<Directive>, KeymapError> {
    rules
        .into_iter()
        .enumerate()
        .map(|(index, rule)| {
            compile_rule(rule).map_err(|e| {
                KeymapError::InvalidRule(format!("block `{}` rule #{}: {}", block, index + 1, e))
            })
        })
        .collect()
}

/// Compile one rule entry into a directive
pub fn compile_rule(rule: RuleConfig) -> Result<Directive, KeymapError> {
    match (rule.add, rule.disable, rule.edit) {
        (Some(add), None, None) => compile_add(add).map(Directive::Add),
        (None, Some(disable), None) => compile_disable(disable).map(Directive::Disable),
        (None, None, Some(edit)) => compile_edit(edit).map(Directive::Edit),
        _ => Err(KeymapError::InvalidRule(
            "rule must have exactly one of `add`, `disable`, `edit`".to_string(),
        )),
    }
}

fn compile_add(config: AddConfig) -> Result<AddDirective, KeymapError> {
    let action = action_ref(&config.action)?;
    let trigger = required_trigger(&config.hotkey)?;

    let replace = match (config.disable_old, config.disable_old_exact_params) {
        (Some(_), Some(_)) => {
            return Err(KeymapError::InvalidRule(
                "`disable_old` and `disable_old_exact_params` are mutually exclusive".to_string(),
            ))
        }
        (Some(DisableOldConfig::Flag(true)), None) => Replace::FirstByAction,
        (Some(DisableOldConfig::Flag(false)), None) | (None, None) => Replace::Nothing,
        (Some(DisableOldConfig::One(spec)), None) => Replace::Hotkeys(triggers(&[spec])?),
        (Some(DisableOldConfig::Many(specs)), None) => Replace::Hotkeys(triggers(&specs)?),
        (None, Some(HotkeyListConfig::One(spec))) => Replace::ExactParams(triggers(&[spec])?),
        (None, Some(HotkeyListConfig::Many(specs))) => Replace::ExactParams(triggers(&specs)?),
    };

    let mut setters = Vec::with_capacity(config.set.len());
    for (name, value) in &config.set {
        let name = name
            .as_str()
            .ok_or_else(|| KeymapError::InvalidSetter(format!("setter name {:?}", name)))?;
        let value: ParamValue = serde_yaml::from_value(value.clone())
            .map_err(|e| KeymapError::InvalidSetter(format!("`{}`: {}", name, e)))?;
        setters.push(ParamSetter::from_config(name, &value)?);
    }

    Ok(AddDirective {
        context: config.keymap,
        action,
        trigger,
        setters,
        replace,
    })
}

fn compile_disable(config: DisableConfig) -> Result<DisableDirective, KeymapError> {
    let context = if config.keymap == "*" {
        ContextPattern::All
    } else {
        ContextPattern::Named(config.keymap)
    };
    let trigger = match config.hotkey {
        Some(spec) => spec.resolve()?,
        None => None,
    };

    Ok(DisableDirective {
        context,
        action: action_pattern(&config.action)?,
        trigger,
    })
}

fn compile_edit(config: EditConfig) -> Result<EditDirective, KeymapError> {
    let old = match (config.old_hotkey, config.old_hotkey_exact_params) {
        (Some(_), Some(_)) => {
            return Err(KeymapError::InvalidRule(
                "`old_hotkey` and `old_hotkey_exact_params` are mutually exclusive".to_string(),
            ))
        }
        (Some(spec), None) => match spec.resolve()? {
            Some(trigger) => EditTarget::Hotkey(trigger),
            None => EditTarget::FirstByAction,
        },
        (None, Some(spec)) => match spec.resolve()? {
            Some(trigger) => EditTarget::HotkeyExactParams(trigger),
            None => EditTarget::FirstByAction,
        },
        (None, None) => EditTarget::FirstByAction,
    };

    Ok(EditDirective {
        context: config.keymap,
        action: action_ref(&config.action)?,
        trigger: required_trigger(&config.hotkey)?,
        old,
    })
}

fn required_trigger(spec: &HotkeySpec) -> Result<Trigger, KeymapError> {
    spec.resolve()?
        .ok_or_else(|| KeymapError::InvalidHotkey("a hotkey is required here".to_string()))
}

fn triggers(specs: &[HotkeySpec]) -> Result<Vec<Trigger>, KeymapError> {
    let mut out = Vec::with_capacity(specs.len());
    for spec in specs {
        if let Some(trigger) = spec.resolve()? {
            out.push(trigger);
        }
    }
    Ok(out)
}

fn split_action(config: &ActionConfig) -> Result<(String, Option<Params>), KeymapError> {
    match config {
        ActionConfig::Id(id) if !id.is_empty() => Ok((id.clone(), None)),
        ActionConfig::Id(_) => Err(KeymapError::InvalidAction("empty action id".to_string())),
        ActionConfig::WithParams(map) => {
            let mut entries = map.iter();
            let (Some((id, params)), None) = (entries.next(), entries.next()) else {
                return Err(KeymapError::InvalidAction(format!(
                    "action mapping must have exactly one id, got {}",
                    map.len()
                )));
            };
            let params = match params {
                ActionParamsConfig::NoParams(false) => Params::new(),
                ActionParamsConfig::NoParams(true) => {
                    return Err(KeymapError::InvalidAction(format!(
                        "`{}: true` is not a parameter map",
                        id
                    )))
                }
                ActionParamsConfig::Params(params) => params.clone(),
            };
            Ok((id.clone(), Some(params)))
        }
    }
}

/// Action for insert/edit directives; `{id: false}` and bare ids both
/// insert without parameters, but only the mapping form compares them
fn action_ref(config: &ActionConfig) -> Result<ActionRef, KeymapError> {
    let (id, params) = split_action(config)?;
    if id.starts_with('*') {
        return Err(KeymapError::InvalidAction(format!(
            "wildcard `{}` is only valid in disable rules",
            id
        )));
    }
    Ok(ActionRef { id, params })
}

fn action_pattern(config: &ActionConfig) -> Result<ActionPattern, KeymapError> {
    let (id, params) = split_action(config)?;
    Ok(ActionPattern::parse(&id, params))
}

/// Errors that can occur when parsing rules or keyconfig files
#[derive(Debug, Clone, PartialEq)]
pub enum KeymapError {
    IoError(String),
    ParseError(String),
    InvalidHotkey(String),
    InvalidAction(String),
    InvalidSetter(String),
    UnknownParam { action: String, param: String },
    InvalidRule(String),
}

impl std::fmt::Display for KeymapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeymapError::IoError(e) => write!(f, "IO error: {}", e),
            KeymapError::ParseError(e) => write!(f, "Parse error: {}", e),
            KeymapError::InvalidHotkey(h) => write!(f, "Invalid hotkey: {}", h),
            KeymapError::InvalidAction(a) => write!(f, "Invalid action: {}", a),
            KeymapError::InvalidSetter(s) => write!(f, "Invalid setter: {}", s),
            KeymapError::UnknownParam { action, param } => {
                write!(f, "Action {} has no parameter `{}`", action, param)
            }
            KeymapError::InvalidRule(r) => write!(f, "Invalid rule: {}", r),
        }
    }
}

impl std::error::Error for KeymapError {}

//! Reconciliation engine: executes ADD / DISABLE / EDIT directives
//!
//! Directives never fail past their own scope. A lookup that finds nothing
//! is a no-op ([`DirectiveOutcome::LookupMiss`]) so rule lists keep working
//! against host layouts where some legacy bindings are gone, and a failing
//! parameter setter leaves the inserted binding with whatever parameters
//! were written before the failure.

use std::fmt;

use super::action::{ActionPattern, ActionRef, ParamSchema, ParamSetter};
use super::config::KeymapError;
use super::hotkey::parse_hotkey;
pub use super::keyconfig::ContextPattern;
use super::keyconfig::Keyconfig;
use super::types::{Modifiers, Trigger};

/// How an ADD deals with the binding it replaces
#[derive(Debug, Clone, PartialEq)]
pub enum Replace {
    Nothing,
    /// Deactivate the first active record bound to the same action id
    FirstByAction,
    /// For each trigger, deactivate the first active record with the same
    /// action id and that trigger
    Hotkeys(Vec<Trigger>),
    /// Like `Hotkeys`, but the record's parameters must equal the new ones
    ExactParams(Vec<Trigger>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddDirective {
    pub context: String,
    pub action: ActionRef,
    pub trigger: Trigger,
    /// Run against the new record after insertion, in order
    pub setters: Vec<ParamSetter>,
    pub replace: Replace,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisableDirective {
    pub context: ContextPattern,
    pub action: ActionPattern,
    /// `None` matches any trigger
    pub trigger: Option<Trigger>,
}

/// Which active record an EDIT rewrites
#[derive(Debug, Clone, PartialEq)]
pub enum EditTarget {
    FirstByAction,
    Hotkey(Trigger),
    HotkeyExactParams(Trigger),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditDirective {
    pub context: String,
    pub action: ActionRef,
    /// New trigger written into the located record
    pub trigger: Trigger,
    pub old: EditTarget,
}

/// One instruction in a rule sequence
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Add(AddDirective),
    Disable(DisableDirective),
    Edit(EditDirective),
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Add(add) => write!(f, "add [{}] {} '{}'", add.context, add.action, add.trigger),
            Directive::Disable(disable) => {
                write!(f, "disable [{}] {}", disable.context, disable.action)?;
                if let Some(ref trigger) = disable.trigger {
                    write!(f, " '{}'", trigger)?;
                }
                Ok(())
            }
            Directive::Edit(edit) => write!(f, "edit [{}] {} -> '{}'", edit.context, edit.action, edit.trigger),
        }
    }
}

/// Result of applying one directive
#[derive(Debug, Clone, PartialEq)]
pub enum DirectiveOutcome {
    Applied,
    /// The context or target record was not found; nothing changed
    LookupMiss,
    /// The binding was inserted but a setter failed part-way
    ParamSetFailure(KeymapError),
}

/// Apply a single directive to a table
pub fn apply(keyconfig: &mut Keyconfig, directive: &Directive, schema: &ParamSchema) -> DirectiveOutcome {
    let outcome = match directive {
        Directive::Add(add) => apply_add(keyconfig, add, schema),
        Directive::Disable(disable) => apply_disable(keyconfig, disable),
        Directive::Edit(edit) => apply_edit(keyconfig, edit),
    };
    match outcome {
        DirectiveOutcome::Applied => {}
        DirectiveOutcome::LookupMiss => {
            tracing::debug!("No match in '{}' for {}", keyconfig.name, directive);
        }
        DirectiveOutcome::ParamSetFailure(ref e) => {
            tracing::debug!("Setter failed for {}: {}", directive, e);
        }
    }
    outcome
}

/// Apply directives in order, accumulating outcomes
pub fn apply_all<'a>(
    keyconfig: &mut Keyconfig,
    directives: impl IntoIterator<Item = &'a Directive>,
    schema: &ParamSchema,
) -> ApplyReport {
    let mut report = ApplyReport::default();
    for directive in directives {
        report.record(directive, apply(keyconfig, directive, schema));
    }
    report
}

fn apply_add(keyconfig: &mut Keyconfig, add: &AddDirective, schema: &ParamSchema) -> DirectiveOutcome {
    let Some(context) = keyconfig.ensure_context(&add.context) else {
        return DirectiveOutcome::LookupMiss;
    };

    // Deactivate the old binding before inserting so both never fire
    match add.replace {
        Replace::Nothing => {}
        Replace::FirstByAction => {
            if let Some(old) = context.find_active_mut(&ActionPattern::id(add.action.id.clone()), None) {
                old.active = false;
            }
        }
        Replace::Hotkeys(ref triggers) => {
            let pattern = ActionPattern::id(add.action.id.clone());
            for trigger in triggers {
                if let Some(old) = context.find_active_mut(&pattern, Some(trigger)) {
                    old.active = false;
                }
            }
        }
        Replace::ExactParams(ref triggers) => {
            let pattern = ActionPattern::from(&add.action);
            for trigger in triggers {
                if let Some(old) = context.find_active_mut(&pattern, Some(trigger)) {
                    old.active = false;
                }
            }
        }
    }

    let id = context.insert(add.action.clone(), add.trigger.clone());

    if add.setters.is_empty() {
        return DirectiveOutcome::Applied;
    }
    let Some(record) = context.get_mut(id) else {
        return DirectiveOutcome::LookupMiss;
    };
    for setter in &add.setters {
        if let Err(e) = setter.apply(&mut record.action, schema) {
            return DirectiveOutcome::ParamSetFailure(e);
        }
    }
    DirectiveOutcome::Applied
}

fn apply_disable(keyconfig: &mut Keyconfig, disable: &DisableDirective) -> DirectiveOutcome {
    let changed: usize = keyconfig
        .contexts_matching(&disable.context)
        .map(|c| c.disable_matching(&disable.action, disable.trigger.as_ref()))
        .sum();
    if changed == 0 {
        DirectiveOutcome::LookupMiss
    } else {
        DirectiveOutcome::Applied
    }
}

fn apply_edit(keyconfig: &mut Keyconfig, edit: &EditDirective) -> DirectiveOutcome {
    let Some(context) = keyconfig.context_mut(&edit.context) else {
        return DirectiveOutcome::LookupMiss;
    };

    let by_id = ActionPattern::id(edit.action.id.clone());
    let record = match edit.old {
        EditTarget::FirstByAction => context.find_active_mut(&by_id, None),
        EditTarget::Hotkey(ref old) => context.find_active_mut(&by_id, Some(old)),
        EditTarget::HotkeyExactParams(ref old) => {
            context.find_active_mut(&ActionPattern::from(&edit.action), Some(old))
        }
    };

    match record {
        Some(record) => {
            edit_trigger(&mut record.trigger, &edit.trigger);
            DirectiveOutcome::Applied
        }
        None => DirectiveOutcome::LookupMiss,
    }
}

/// Rewrite a trigger in place
///
/// Key, modifiers and phase are taken from `new`. The chord key is kept
/// unless `new` names one, and repeat is only ever switched on.
pub fn edit_trigger(trigger: &mut Trigger, new: &Trigger) {
    trigger.key = new.key.clone();
    trigger.modifiers = new.modifiers;
    if new.key_modifier.is_some() {
        trigger.key_modifier = new.key_modifier.clone();
    }
    trigger.value = new.value;
    if new.repeat {
        trigger.repeat = true;
    }
}

/// Bulk-disable selection: include tokens plus exact-trigger exceptions
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSpec {
    include: Vec<String>,
    exceptions: Vec<String>,
}

impl SweepSpec {
    /// Exceptions are normalised to their sweep key; ones that do not
    /// parse are kept literally
    pub fn new(include: Vec<String>, exceptions: Vec<String>) -> Self {
        let exceptions = exceptions
            .into_iter()
            .map(|e| match parse_hotkey(&e) {
                Ok(trigger) => sweep_key(&trigger),
                Err(err) => {
                    tracing::warn!("Sweep exception '{}' kept literally: {}", e, err);
                    e
                }
            })
            .collect();
        Self { include, exceptions }
    }

    pub fn include(&self) -> &[String] {
        &self.include
    }

    pub fn exceptions(&self) -> &[String] {
        &self.exceptions
    }

    /// Does the sweep disable a binding with this trigger?
    ///
    /// Modifier tokens select by modifier flag, any other token selects by
    /// primary-key prefix (case-insensitive).
    pub fn selects(&self, trigger: &Trigger) -> bool {
        if self.exceptions.contains(&sweep_key(trigger)) {
            return false;
        }
        self.include.iter().any(|token| match Modifiers::from_token(token) {
            Some(modifier) if modifier != Modifiers::ANY => trigger.modifiers.contains(modifier),
            _ => trigger
                .key
                .to_ascii_uppercase()
                .starts_with(&token.to_ascii_uppercase()),
        })
    }
}

/// Identity of a trigger for exception matching: key, modifiers and chord
/// key. Phase and repeat are ignored so "Z cmd" also spares "Z cmd repeat".
fn sweep_key(trigger: &Trigger) -> String {
    let mut key = trigger.key.clone();
    if trigger.modifiers != Modifiers::NONE {
        key.push(' ');
        key.push_str(&trigger.modifiers.to_string());
    }
    if let Some(ref chord) = trigger.key_modifier {
        key.push(' ');
        key.push_str(chord);
    }
    key
}

/// Disable every active input binding the sweep selects
pub fn sweep(keyconfig: &mut Keyconfig, spec: &SweepSpec) -> usize {
    let mut count = 0;
    for context in &mut keyconfig.contexts {
        for record in &mut context.items {
            if record.active && record.trigger.is_input_event() && spec.selects(&record.trigger) {
                record.active = false;
                count += 1;
            }
        }
    }
    tracing::debug!("Sweep disabled {} bindings in '{}'", count, keyconfig.name);
    count
}

/// Tally of directive outcomes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub applied: usize,
    pub misses: usize,
    /// One line per failed setter: directive and error
    pub param_failures: Vec<String>,
}

impl ApplyReport {
    pub fn record(&mut self, directive: &Directive, outcome: DirectiveOutcome) {
        match outcome {
            DirectiveOutcome::Applied => self.applied += 1,
            DirectiveOutcome::LookupMiss => self.misses += 1,
            DirectiveOutcome::ParamSetFailure(e) => {
                self.param_failures.push(format!("{}: {}", directive, e));
            }
        }
    }

    pub fn merge(&mut self, other: ApplyReport) {
        self.applied += other.applied;
        self.misses += other.misses;
        self.param_failures.extend(other.param_failures);
    }

    pub fn total(&self) -> usize {
        self.applied + self.misses + self.param_failures.len()
    }
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} applied, {} no-op, {} setter failures",
            self.applied,
            self.misses,
            self.param_failures.len()
        )
    }
}

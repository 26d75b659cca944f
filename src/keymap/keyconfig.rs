//! Keyconfig: a named, ordered collection of contexts

use std::fmt;

use serde::{Deserialize, Serialize};

use super::action::ActionPattern;
use super::binding::{BindingId, BindingRecord};
use super::context::KeyContext;
use super::types::Trigger;

/// Which role a keyconfig table plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyconfigKind {
    /// Factory/base snapshot, read-only to the pipeline
    Default,
    /// Table under construction by the build pipeline
    Build,
    /// The live user table, edited by integrations and quick bindings
    User,
    /// Additive add-on bindings, removable as a group
    Addon,
}

impl KeyconfigKind {
    /// Only build and add-on tables may grow new contexts
    pub fn creates_contexts(self) -> bool {
        matches!(self, KeyconfigKind::Build | KeyconfigKind::Addon)
    }
}

impl fmt::Display for KeyconfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyconfigKind::Default => "default",
            KeyconfigKind::Build => "build",
            KeyconfigKind::User => "user",
            KeyconfigKind::Addon => "addon",
        };
        f.write_str(name)
    }
}

/// Which contexts a query covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextPattern {
    /// `*`: every context in the table
    All,
    Named(String),
}

impl ContextPattern {
    pub fn parse(name: &str) -> Self {
        if name == "*" {
            ContextPattern::All
        } else {
            ContextPattern::Named(name.to_string())
        }
    }

    pub fn covers(&self, context: &str) -> bool {
        match self {
            ContextPattern::All => true,
            ContextPattern::Named(name) => name == context,
        }
    }
}

impl fmt::Display for ContextPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextPattern::All => f.write_str("*"),
            ContextPattern::Named(name) => f.write_str(name),
        }
    }
}

/// A named table of contexts
#[derive(Debug, Clone, PartialEq)]
pub struct Keyconfig {
    pub name: String,
    pub kind: KeyconfigKind,
    pub contexts: Vec<KeyContext>,
}

impl Keyconfig {
    pub fn new(name: impl Into<String>, kind: KeyconfigKind) -> Self {
        Self {
            name: name.into(),
            kind,
            contexts: Vec::new(),
        }
    }

    /// Add a context (builder pattern)
    pub fn with_context(mut self, context: KeyContext) -> Self {
        self.contexts.push(context);
        self
    }

    pub fn context(&self, name: &str) -> Option<&KeyContext> {
        self.contexts.iter().find(|c| c.name == name)
    }

    pub fn context_mut(&mut self, name: &str) -> Option<&mut KeyContext> {
        self.contexts.iter_mut().find(|c| c.name == name)
    }

    /// Existing context, or a new empty one on tables that may create them
    pub fn ensure_context(&mut self, name: &str) -> Option<&mut KeyContext> {
        if let Some(index) = self.contexts.iter().position(|c| c.name == name) {
            return Some(&mut self.contexts[index]);
        }
        if !self.kind.creates_contexts() {
            return None;
        }
        tracing::debug!("Creating context '{}' in keyconfig '{}'", name, self.name);
        self.contexts.push(KeyContext::new(name));
        self.contexts.last_mut()
    }

    /// Contexts covered by `pattern`, in stored order
    pub fn contexts_matching<'a>(
        &'a mut self,
        pattern: &'a ContextPattern,
    ) -> impl Iterator<Item = &'a mut KeyContext> + 'a {
        self.contexts
            .iter_mut()
            .filter(move |c| pattern.covers(&c.name))
    }

    /// First matching record, scanning contexts then records in stored order
    pub fn find_first(
        &self,
        context: &str,
        action: &ActionPattern,
        trigger: Option<&Trigger>,
    ) -> Option<&BindingRecord> {
        let pattern = ContextPattern::parse(context);
        self.contexts
            .iter()
            .filter(|c| pattern.covers(&c.name))
            .find_map(|c| c.find_first(action, trigger))
    }

    /// Locate a record by identity along with its context name
    pub fn find_by_id(&self, id: BindingId) -> Option<(&str, &BindingRecord)> {
        self.contexts
            .iter()
            .find_map(|c| c.get(id).map(|r| (c.name.as_str(), r)))
    }

    pub fn set_active(&mut self, id: BindingId, active: bool) -> bool {
        self.contexts.iter_mut().any(|c| c.set_active(id, active))
    }

    pub fn remove(&mut self, id: BindingId) -> Option<BindingRecord> {
        self.contexts.iter_mut().find_map(|c| c.remove(id))
    }

    /// Remove every inactive record in every context
    pub fn prune_inactive(&mut self) -> usize {
        self.contexts.iter_mut().map(KeyContext::prune_inactive).sum()
    }

    /// Replace this table's contexts with fresh-identity copies of `source`'s
    pub fn clone_contexts_from(&mut self, source: &Keyconfig) {
        self.contexts = source.contexts.iter().map(KeyContext::clone_fresh).collect();
    }

    /// Every record with the name of the context that holds it
    pub fn iter_records(&self) -> impl Iterator<Item = (&str, &BindingRecord)> {
        self.contexts
            .iter()
            .flat_map(|c| c.items.iter().map(move |r| (c.name.as_str(), r)))
    }

    pub fn record_count(&self) -> usize {
        self.contexts.iter().map(|c| c.items.len()).sum()
    }

    pub fn active_count(&self) -> usize {
        self.contexts.iter().map(KeyContext::active_count).sum()
    }
}

//! Session: the process-wide context shared by the pipeline and the
//! deferred messages it schedules
//!
//! Created at registration and torn down at unregistration. Everything a
//! deferred step needs is reached through `&mut Session` rather than
//! ambient globals.

use std::collections::HashMap;

use crate::config::BuilderConfig;
use crate::keymap::{
    apply, AddDirective, BindingId, DirectiveOutcome, DisableDirective, Directive, EditDirective,
    Keyconfig, KeyconfigStore, RuleSet, DEFAULT_KEYCONFIG_NAME,
};
use crate::pipeline::BuildState;

pub struct Session {
    pub store: KeyconfigStore,
    pub rules: RuleSet,
    pub config: BuilderConfig,
    /// State of the current (or last) rebuild
    pub build: Option<BuildState>,
    /// Add-on bindings registered by this session, removed as a group
    overlay: Vec<(String, BindingId)>,
    /// User-table bindings suspended per context, re-enabled by identity
    suspended: HashMap<String, Vec<BindingId>>,
    generation: u64,
}

impl Session {
    /// Initialise the table store from a base snapshot and register the
    /// rule set's add-on bindings
    pub fn register(config: BuilderConfig, base: Keyconfig, rules: RuleSet) -> Self {
        tracing::info!(
            "Registering session: base '{}' ({} contexts, {} bindings), {} rule blocks",
            base.name,
            base.contexts.len(),
            base.record_count(),
            rules.blocks.len()
        );
        let overlay = rules.overlay.clone();
        let mut session = Self {
            store: KeyconfigStore::from_default(base),
            rules,
            config,
            build: None,
            overlay: Vec::new(),
            suspended: HashMap::new(),
            generation: 0,
        };
        for add in overlay {
            if let DirectiveOutcome::ParamSetFailure(e) = session.register_overlay_binding(add) {
                tracing::warn!("Add-on binding registered with incomplete parameters: {}", e);
            }
        }
        tracing::debug!("Registered {} add-on bindings", session.overlay.len());
        session
    }

    /// Remove every add-on binding this session registered and drop any
    /// in-flight build so its deferred steps are ignored
    pub fn unregister(&mut self) -> usize {
        let addon = self.store.addon_mut();
        let removed = self
            .overlay
            .drain(..)
            .filter(|(context, id)| {
                addon
                    .context_mut(context)
                    .and_then(|c| c.remove(*id))
                    .is_some()
            })
            .count();
        self.build = None;
        self.generation += 1;
        tracing::info!("Unregistered session, removed {} add-on bindings", removed);
        removed
    }

    /// Name of the keyconfig the pipeline builds
    pub fn keyconfig_name(&self) -> String {
        self.config
            .keyconfig_name
            .clone()
            .or_else(|| self.rules.name.clone())
            .unwrap_or_else(|| DEFAULT_KEYCONFIG_NAME.to_string())
    }

    pub fn is_integration_enabled(&self, addon: &str) -> bool {
        self.config.is_integration_enabled(addon)
    }

    /// Current build generation; deferred messages carry the value they
    /// were scheduled under
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new build generation, superseding any pending deferred steps
    pub(crate) fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Add a binding to the add-on table and track it for unregistration
    pub fn register_overlay_binding(&mut self, add: AddDirective) -> DirectiveOutcome {
        let context = add.context.clone();
        let addon = self.store.addon_mut();
        let outcome = apply(addon, &Directive::Add(add), &self.rules.schema);
        if outcome != DirectiveOutcome::LookupMiss {
            if let Some(record) = addon.context(&context).and_then(|c| c.items.last()) {
                self.overlay.push((context, record.id));
            }
        }
        outcome
    }

    pub fn overlay_len(&self) -> usize {
        self.overlay.len()
    }

    /// Add a binding directly to the live user table
    pub fn quick_add(&mut self, add: AddDirective) -> DirectiveOutcome {
        apply(self.store.user_mut(), &Directive::Add(add), &self.rules.schema)
    }

    pub fn quick_disable(&mut self, disable: DisableDirective) -> DirectiveOutcome {
        apply(
            self.store.user_mut(),
            &Directive::Disable(disable),
            &self.rules.schema,
        )
    }

    pub fn quick_edit(&mut self, edit: EditDirective) -> DirectiveOutcome {
        apply(self.store.user_mut(), &Directive::Edit(edit), &self.rules.schema)
    }

    /// Deactivate every active binding of a user context until
    /// [`Session::resume_context`] is called
    pub fn suspend_context(&mut self, context: &str) -> usize {
        let Some(ctx) = self.store.user_mut().context_mut(context) else {
            return 0;
        };
        let ids = ctx.disable_active_items();
        let count = ids.len();
        self.suspended.entry(context.to_string()).or_default().extend(ids);
        tracing::debug!("Suspended {} bindings in '{}'", count, context);
        count
    }

    /// Re-enable exactly the bindings a previous suspend turned off
    pub fn resume_context(&mut self, context: &str) -> usize {
        let Some(mut ids) = self.suspended.remove(context) else {
            return 0;
        };
        match self.store.user_mut().context_mut(context) {
            Some(ctx) => ctx.enable_items(&mut ids),
            None => 0,
        }
    }

    /// Physically remove the active bindings of a user context
    pub fn remove_active_bindings(&mut self, context: &str) -> usize {
        self.store
            .user_mut()
            .context_mut(context)
            .map_or(0, |c| c.remove_active_items())
    }
}

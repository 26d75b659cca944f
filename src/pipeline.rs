//! Build pipeline: base snapshot → build table → sweep → rules →
//! integrations → prune → persist
//!
//! Steps run strictly in order. [`BuildState::advance`] refuses any
//! transition that skips or repeats a step, so pruning can never run before
//! the integration rules and persistence can never run before pruning.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::keymap::{
    apply_all, export_keyconfig, export_path, keyconfig_to_file, sweep, ApplyReport, Keyconfig,
    KeyconfigFile, KeymapError, TableRef,
};
use crate::session::Session;
use crate::tracing::TableSnapshot;

/// Lifecycle of one build table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuildStage {
    Empty,
    ClonedFromBase,
    BulkDisabled,
    RulesApplied,
    IntegrationsApplied,
    Pruned,
    Persisted,
}

impl BuildStage {
    /// Stages reachable from this one; rule blocks may apply repeatedly
    fn allows(self, to: BuildStage) -> bool {
        use BuildStage::*;
        matches!(
            (self, to),
            (Empty, ClonedFromBase)
                | (ClonedFromBase, BulkDisabled)
                | (BulkDisabled, RulesApplied)
                | (RulesApplied, RulesApplied)
                | (RulesApplied, IntegrationsApplied)
                | (IntegrationsApplied, Pruned)
                | (Pruned, Persisted)
        )
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStage::Empty => "empty",
            BuildStage::ClonedFromBase => "cloned-from-base",
            BuildStage::BulkDisabled => "bulk-disabled",
            BuildStage::RulesApplied => "rules-applied",
            BuildStage::IntegrationsApplied => "integrations-applied",
            BuildStage::Pruned => "pruned",
            BuildStage::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Progress and results of one rebuild
#[derive(Debug, Clone)]
pub struct BuildState {
    pub name: String,
    pub generation: u64,
    stage: BuildStage,
    pub swept: usize,
    pub rules: ApplyReport,
    pub integrations: ApplyReport,
    pub integrations_applied: Vec<String>,
    pub integrations_skipped: Vec<String>,
    pub pruned: usize,
    pub export_path: Option<PathBuf>,
}

impl BuildState {
    pub fn new(name: impl Into<String>, generation: u64) -> Self {
        Self {
            name: name.into(),
            generation,
            stage: BuildStage::Empty,
            swept: 0,
            rules: ApplyReport::default(),
            integrations: ApplyReport::default(),
            integrations_applied: Vec::new(),
            integrations_skipped: Vec::new(),
            pruned: 0,
            export_path: None,
        }
    }

    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    /// Move to the next stage, refusing out-of-order transitions
    pub fn advance(&mut self, to: BuildStage) -> Result<(), PipelineError> {
        if !self.stage.allows(to) {
            return Err(PipelineError::OutOfOrder {
                from: self.stage,
                to,
            });
        }
        if self.stage != to {
            tracing::info!("Keyconfig '{}': {} → {}", self.name, self.stage, to);
        }
        self.stage = to;
        Ok(())
    }

    /// Check the stage a step expects to start from
    fn expect(&self, stage: BuildStage, next: BuildStage) -> Result<(), PipelineError> {
        if self.stage == stage {
            Ok(())
        } else {
            Err(PipelineError::OutOfOrder {
                from: self.stage,
                to: next,
            })
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Keyconfig '{}' ({})", self.name, self.stage)?;
        writeln!(f, "  swept:        {}", self.swept)?;
        writeln!(f, "  rules:        {}", self.rules)?;
        writeln!(f, "  integrations: {}", self.integrations)?;
        if !self.integrations_skipped.is_empty() {
            writeln!(f, "  skipped:      {}", self.integrations_skipped.join(", "))?;
        }
        for failure in self.rules.param_failures.iter().chain(&self.integrations.param_failures) {
            writeln!(f, "  ! {}", failure)?;
        }
        write!(f, "  pruned:       {}", self.pruned)?;
        if let Some(ref path) = self.export_path {
            write!(f, "\n  exported:     {}", path.display())?;
        }
        Ok(())
    }
}

/// Errors that halt the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    OutOfOrder { from: BuildStage, to: BuildStage },
    /// No build in progress, or its table has gone
    MissingBuild,
    Keymap(KeymapError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::OutOfOrder { from, to } => {
                write!(f, "Build step out of order: {} → {}", from, to)
            }
            PipelineError::MissingBuild => write!(f, "No keyconfig build in progress"),
            PipelineError::Keymap(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<KeymapError> for PipelineError {
    fn from(e: KeymapError) -> Self {
        PipelineError::Keymap(e)
    }
}

/// Steps 1-5: restore base, replace build table, clone, sweep, apply rules
///
/// Returns the generation that the deferred steps must carry.
pub fn run_synchronous(session: &mut Session) -> Result<u64, PipelineError> {
    let name = session.keyconfig_name();
    let generation = session.next_generation();
    let mut state = BuildState::new(name.clone(), generation);

    session.store.restore_default_keymaps();

    let build = session.store.new_build_keyconfig(&name);
    state.advance(BuildStage::ClonedFromBase)?;
    let mut snapshot = TableSnapshot::from_keyconfig(build);
    tracing::debug!(
        "Cloned {} contexts, {} bindings into '{}'",
        snapshot.contexts,
        snapshot.records,
        name
    );

    if let Some(ref spec) = session.rules.sweep {
        state.swept = sweep(build, spec);
    }
    state.advance(BuildStage::BulkDisabled)?;
    log_change(&name, "sweep", &mut snapshot, build);

    for block in &session.rules.blocks {
        let report = apply_all(build, &block.directives, &session.rules.schema);
        tracing::debug!("Block '{}': {}", block.name, report);
        state.rules.merge(report);
        state.advance(BuildStage::RulesApplied)?;
    }
    if session.rules.blocks.is_empty() {
        state.advance(BuildStage::RulesApplied)?;
    }
    log_change(&name, "rules", &mut snapshot, build);

    tracing::info!(
        "Built '{}': swept {}, rules {}",
        name,
        state.swept,
        state.rules
    );
    session.build = Some(state);
    Ok(generation)
}

/// Step 6: integration rules against the live user table
///
/// Blocks for add-ons that are not enabled are skipped entirely.
pub fn apply_integrations(session: &mut Session) -> Result<&ApplyReport, PipelineError> {
    let state = session.build.as_mut().ok_or(PipelineError::MissingBuild)?;
    state.expect(BuildStage::RulesApplied, BuildStage::IntegrationsApplied)?;

    let user = session.store.user_mut();
    for block in &session.rules.integrations {
        if !session.config.is_integration_enabled(&block.addon) {
            tracing::info!("Integration '{}' not enabled, skipping", block.addon);
            state.integrations_skipped.push(block.addon.clone());
            continue;
        }
        let report = apply_all(user, &block.directives, &session.rules.schema);
        tracing::info!("Integration '{}': {}", block.addon, report);
        state.integrations.merge(report);
        state.integrations_applied.push(block.addon.clone());
    }

    state.advance(BuildStage::IntegrationsApplied)?;
    Ok(&state.integrations)
}

/// Step 7: physically remove inactive records from the build table
pub fn prune(session: &mut Session) -> Result<usize, PipelineError> {
    let state = session.build.as_mut().ok_or(PipelineError::MissingBuild)?;
    state.expect(BuildStage::IntegrationsApplied, BuildStage::Pruned)?;

    let build = session
        .store
        .get_mut(&TableRef::Named(state.name.clone()))
        .ok_or(PipelineError::MissingBuild)?;
    state.pruned = build.prune_inactive();
    tracing::info!("Pruned {} inactive bindings from '{}'", state.pruned, state.name);

    state.advance(BuildStage::Pruned)?;
    Ok(state.pruned)
}

/// Saved form of the live user table
#[derive(Debug, Serialize, Deserialize)]
pub struct Preferences {
    pub active_keyconfig: Option<String>,
    pub user_keyconfig: KeyconfigFile,
}

/// Files step 8 writes, in order: preferences first, then the export
#[derive(Debug, Clone, PartialEq)]
pub struct PersistPayload {
    pub preferences_path: PathBuf,
    pub preferences: String,
    pub export_path: PathBuf,
    pub export: String,
}

/// Step 8: serialize preferences and the pruned build table
///
/// The stage only moves to `Persisted` once the files are written
/// (see [`mark_persisted`]).
pub fn persist_payload(
    session: &Session,
    presets_dir: &Path,
    preferences_path: &Path,
) -> Result<PersistPayload, PipelineError> {
    let state = session.build.as_ref().ok_or(PipelineError::MissingBuild)?;
    state.expect(BuildStage::Pruned, BuildStage::Persisted)?;

    let build = session
        .store
        .get(&TableRef::Named(state.name.clone()))
        .ok_or(PipelineError::MissingBuild)?;

    let preferences = Preferences {
        active_keyconfig: session.store.active_name().map(str::to_string),
        user_keyconfig: keyconfig_to_file(session.store.user(), true),
    };
    let preferences = serde_json::to_string_pretty(&preferences)
        .map_err(|e| PipelineError::Keymap(KeymapError::ParseError(e.to_string())))?;

    Ok(PersistPayload {
        preferences_path: preferences_path.to_path_buf(),
        preferences,
        export_path: export_path(presets_dir, &state.name),
        export: export_keyconfig(build)?,
    })
}

/// Record that the export has been written
pub fn mark_persisted(session: &mut Session, path: PathBuf) -> Result<(), PipelineError> {
    let state = session.build.as_mut().ok_or(PipelineError::MissingBuild)?;
    state.advance(BuildStage::Persisted)?;
    state.export_path = Some(path);
    Ok(())
}

fn log_change(name: &str, step: &str, snapshot: &mut TableSnapshot, build: &Keyconfig) {
    let after = TableSnapshot::from_keyconfig(build);
    if let Some(diff) = snapshot.diff(&after) {
        tracing::debug!("'{}' after {}: {}", name, step, diff);
    }
    *snapshot = after;
}

//! Build pipeline message handlers
//!
//! Steps 1-5 run inside `Rebuild`; each later step is deferred and carries
//! the generation it was scheduled under.

use crate::commands::Cmd;
use crate::messages::{BuildMsg, Msg};
use crate::pipeline::{self, PipelineError};
use crate::session::Session;

/// Handle build pipeline messages
pub fn update_build(session: &mut Session, msg: BuildMsg) -> Option<Cmd> {
    match msg {
        BuildMsg::Rebuild => match pipeline::run_synchronous(session) {
            Ok(generation) => Some(Cmd::Defer(Msg::Build(BuildMsg::ApplyIntegrations {
                generation,
            }))),
            Err(e) => Some(failed("rebuild", e)),
        },

        BuildMsg::ApplyIntegrations { generation } => {
            if is_stale(session, generation, "apply-integrations") {
                return None;
            }
            match pipeline::apply_integrations(session) {
                Ok(report) => {
                    tracing::debug!("Integrations: {}", report);
                    Some(Cmd::Defer(Msg::Build(BuildMsg::Prune { generation })))
                }
                Err(e) => Some(failed("apply-integrations", e)),
            }
        }

        BuildMsg::Prune { generation } => {
            if is_stale(session, generation, "prune") {
                return None;
            }
            match pipeline::prune(session) {
                Ok(_) => Some(Cmd::Defer(Msg::Build(BuildMsg::Persist { generation }))),
                Err(e) => Some(failed("prune", e)),
            }
        }

        BuildMsg::Persist { generation } => {
            if is_stale(session, generation, "persist") {
                return None;
            }
            let (Some(presets_dir), Some(preferences_path)) =
                (session.config.presets_dir(), session.config.userpref_file())
            else {
                tracing::warn!("No presets or preferences location, skipping persist");
                return Some(Cmd::Report(
                    "Build not saved: no config directory available".to_string(),
                ));
            };

            match pipeline::persist_payload(session, &presets_dir, &preferences_path) {
                Ok(payload) => Some(Cmd::WriteFiles {
                    files: vec![
                        (payload.preferences_path, payload.preferences),
                        (payload.export_path, payload.export),
                    ],
                    generation,
                }),
                Err(e) => Some(failed("persist", e)),
            }
        }

        BuildMsg::PersistCompleted { generation, result } => {
            if is_stale(session, generation, "persist-completed") {
                return None;
            }
            match result {
                Ok(path) => {
                    let report = format!("Exported keyconfig to {}", path.display());
                    match pipeline::mark_persisted(session, path) {
                        Ok(()) => Some(Cmd::Report(report)),
                        Err(e) => Some(failed("persist", e)),
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to write keyconfig files: {}", e);
                    Some(Cmd::Report(format!("Error saving keyconfig: {}", e)))
                }
            }
        }
    }
}

/// A deferred step from a superseded rebuild (or after unregistration)
fn is_stale(session: &Session, generation: u64, step: &str) -> bool {
    let current = session.generation();
    let live = session
        .build
        .as_ref()
        .is_some_and(|b| b.generation == generation);
    if generation != current || !live {
        tracing::warn!(
            "Dropping stale {} (generation {}, current {})",
            step,
            generation,
            current
        );
        return true;
    }
    false
}

fn failed(step: &str, e: PipelineError) -> Cmd {
    tracing::error!("Build step {} failed: {}", step, e);
    Cmd::Report(format!("Build failed at {}: {}", step, e))
}

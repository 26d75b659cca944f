//! Command types for the Elm-style architecture
//!
//! Commands represent side effects that should be performed after an update.

use std::path::PathBuf;

use crate::messages::Msg;

/// Commands returned by update functions
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cmd {
    /// No command - do nothing
    #[default]
    None,
    /// Deliver a message on the next idle tick
    Defer(Msg),
    /// Write files in order, stopping at the first failure, then send
    /// `BuildMsg::PersistCompleted` with the last path written
    WriteFiles {
        files: Vec<(PathBuf, String)>,
        generation: u64,
    },
    /// Surface a user-facing status line
    Report(String),
}

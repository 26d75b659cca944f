//! Message types for the Elm-style architecture
//!
//! All session state changes flow through these message types.

use std::path::PathBuf;

/// Build pipeline messages
///
/// Every deferred step carries the generation of the rebuild that
/// scheduled it; messages from a superseded rebuild are dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildMsg {
    /// Run steps 1-5 synchronously and schedule the rest
    Rebuild,
    /// Step 6: integration rules against the user keyconfig
    ApplyIntegrations { generation: u64 },
    /// Step 7: drop inactive bindings from the build keyconfig
    Prune { generation: u64 },
    /// Step 8: save preferences and export the build keyconfig
    Persist { generation: u64 },
    /// Persistence finished (async result, export path on success)
    PersistCompleted {
        generation: u64,
        result: Result<PathBuf, String>,
    },
}

/// Top-level message type
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Keyconfig build messages
    Build(BuildMsg),
}

// Convenience constructors for common messages
impl Msg {
    /// Create a rebuild request
    pub fn rebuild() -> Self {
        Msg::Build(BuildMsg::Rebuild)
    }
}

//! Keyconfig Builder - Elm-style keymap rule compiler
//!
//! This crate compiles declarative keymap rules into a consistent keyconfig
//! for a 3D application: it clones a base snapshot, bulk-disables risky
//! bindings, applies rule blocks and add-on integrations, prunes, and
//! exports the result.

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_paths;
pub mod keymap;
pub mod messages;
pub mod pipeline;
pub mod runtime;
pub mod session;
pub mod tracing;
pub mod update;

// Re-export commonly used types
pub use commands::Cmd;
pub use config::BuilderConfig;
pub use messages::Msg;
pub use runtime::Runtime;
pub use session::Session;

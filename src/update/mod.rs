//! Update functions for the Elm-style architecture
//!
//! All session state transformations flow through these functions.

mod build;

use crate::commands::Cmd;
use crate::messages::Msg;
use crate::session::Session;

pub use build::update_build;

/// Main update function - dispatches to sub-handlers
pub fn update(session: &mut Session, msg: Msg) -> Option<Cmd> {
    match msg {
        Msg::Build(m) => update_build(session, m),
    }
}

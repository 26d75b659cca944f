//! Runtime module - message loop and side effects
//!
//! - `app` - owns the session, executes commands and delivers deferred
//!   messages one idle tick at a time

pub mod app;

pub use app::Runtime;

//! Tracing infrastructure for build diagnostics
//!
//! Provides structured logging plus a small table snapshot used to log
//! what each pipeline step changed.
//!
//! # Usage
//!
//! Configure via RUST_LOG environment variable:
//! - `RUST_LOG=debug` - all debug logs, including every directive miss
//! - `RUST_LOG=keyconfig_builder::pipeline=info` - step transitions only
//! - `RUST_LOG=keyconfig_builder::keymap=debug` - engine-level filtering
//!
//! # Log Files
//!
//! Logs are written to `~/.config/keyconfig-builder/logs/keyconfig-builder.log`
//! with daily rotation. File logging uses debug level by default.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::keymap::Keyconfig;

/// Initialize tracing subscriber with console and file logging
///
/// Console output respects RUST_LOG (default `warn`). File logging writes
/// to the config dir's `logs/` with daily rotation.
pub fn init() {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // Console layer - respects RUST_LOG
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_filter(console_filter);

    // File layer - always debug level for troubleshooting
    let file_layer = match crate::config_paths::ensure_logs_dir() {
        Ok(logs_dir) => {
            let file_appender =
                tracing_appender::rolling::daily(logs_dir, crate::config_paths::LOG_FILE_PREFIX);
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        Err(e) => {
            eprintln!("Warning: Could not initialize file logging: {}", e);
            None
        }
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

/// Lightweight snapshot of a table's record counts for diffing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSnapshot {
    pub contexts: usize,
    pub records: usize,
    pub active: usize,
}

impl TableSnapshot {
    pub fn from_keyconfig(keyconfig: &Keyconfig) -> Self {
        Self {
            contexts: keyconfig.contexts.len(),
            records: keyconfig.record_count(),
            active: keyconfig.active_count(),
        }
    }

    /// Describe what changed between two snapshots
    pub fn diff(&self, other: &TableSnapshot) -> Option<String> {
        let mut changes = Vec::new();
        if self.contexts != other.contexts {
            changes.push(format!("contexts: {} → {}", self.contexts, other.contexts));
        }
        if self.records != other.records {
            changes.push(format!("records: {} → {}", self.records, other.records));
        }
        if self.active != other.active {
            changes.push(format!("active: {} → {}", self.active, other.active));
        }

        if changes.is_empty() {
            None
        } else {
            Some(changes.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_diff() {
        let before = TableSnapshot {
            contexts: 2,
            records: 10,
            active: 10,
        };
        let after = TableSnapshot {
            active: 7,
            ..before.clone()
        };
        assert_eq!(before.diff(&before), None);
        assert_eq!(before.diff(&after).as_deref(), Some("active: 10 → 7"));
    }
}

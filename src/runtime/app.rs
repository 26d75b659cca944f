use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::commands::Cmd;
use crate::messages::{BuildMsg, Msg};
use crate::session::Session;
use crate::update::update;

/// Drives a [`Session`] through the update loop
///
/// Deferred messages and file writes complete asynchronously and come back
/// through the channel; nothing they trigger runs inside the `update` call
/// that scheduled them.
pub struct Runtime {
    pub session: Session,
    msg_tx: Sender<Msg>,
    msg_rx: Receiver<Msg>,
    in_flight: usize,
    reports: Vec<String>,
}

impl Runtime {
    pub fn new(session: Session) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel();
        Self {
            session,
            msg_tx,
            msg_rx,
            in_flight: 0,
            reports: Vec::new(),
        }
    }

    /// Run one message through `update` and execute the resulting command
    pub fn dispatch(&mut self, msg: Msg) {
        if let Some(cmd) = update(&mut self.session, msg) {
            self.process_cmd(cmd);
        }
    }

    /// Deliver every message that arrived before this tick
    ///
    /// Messages scheduled while handling them wait for the next tick.
    pub fn tick(&mut self) -> usize {
        let ready: Vec<Msg> = self.msg_rx.try_iter().collect();
        let count = ready.len();
        self.in_flight = self.in_flight.saturating_sub(count);
        for msg in ready {
            self.dispatch(msg);
        }
        count
    }

    /// Block until no deferred message or file write is outstanding
    pub fn run_until_idle(&mut self) {
        while self.in_flight > 0 {
            match self.msg_rx.recv() {
                Ok(msg) => {
                    self.in_flight -= 1;
                    self.dispatch(msg);
                }
                Err(_) => break,
            }
        }
    }

    /// Deferred messages and writes not yet delivered
    pub fn pending(&self) -> usize {
        self.in_flight
    }

    /// User-facing status lines produced since the last call
    pub fn take_reports(&mut self) -> Vec<String> {
        std::mem::take(&mut self.reports)
    }

    fn process_cmd(&mut self, cmd: Cmd) {
        match cmd {
            Cmd::None => {}
            Cmd::Defer(msg) => {
                if self.msg_tx.send(msg).is_ok() {
                    self.in_flight += 1;
                }
            }
            Cmd::WriteFiles { files, generation } => {
                let tx = self.msg_tx.clone();
                self.in_flight += 1;
                std::thread::spawn(move || {
                    let result = write_files(files);
                    let _ = tx.send(Msg::Build(BuildMsg::PersistCompleted { generation, result }));
                });
            }
            Cmd::Report(message) => {
                tracing::info!("{}", message);
                self.reports.push(message);
            }
        }
    }
}

/// Write each file in order, creating parent directories, stopping at the
/// first failure. Returns the last path written.
fn write_files(files: Vec<(PathBuf, String)>) -> Result<PathBuf, String> {
    let mut last = None;
    for (path, content) in files {
        if let Some(parent) = path.parent() {
            crate::config_paths::ensure_dir(parent)?;
        }
        std::fs::write(&path, content)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        tracing::debug!("Wrote {}", path.display());
        last = Some(path);
    }
    last.ok_or_else(|| "Nothing to write".to_string())
}

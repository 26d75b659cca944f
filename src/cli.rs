//! Command-line argument parsing for the builder
//!
//! Supports:
//! - Rebuilding and exporting the keyconfig (default)
//! - Checking rules against a base snapshot without writing anything
//! - Showing a table as YAML
//! - Writing a starter config and rules file

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::BuilderConfig;
use crate::keymap::{
    default_base_keyconfig, load_default_rules, load_keyconfig_file, load_rules_file, merge_rules,
    Keyconfig, KeyconfigKind, KeymapError, RuleSet,
};
use crate::session::Session;

/// Keymap rule compiler for 3D app keyconfigs
#[derive(Parser, Debug)]
#[command(name = "keyconfig-builder", version, about = "Build a keyconfig from rules")]
pub struct CliArgs {
    /// Config file (defaults to the user config dir)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base keyconfig snapshot to build from
    #[arg(long, global = true, value_name = "FILE")]
    pub base: Option<PathBuf>,

    /// Extra rules file layered on the defaults
    #[arg(long, global = true, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Presets directory exports are written to
    #[arg(long, global = true, value_name = "DIR")]
    pub presets: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Build the keyconfig, save preferences and export it
    Rebuild,
    /// Build in memory and report what the rules did
    Check,
    /// Print a table as YAML
    Show {
        /// Only this context
        #[arg(long)]
        context: Option<String>,
        /// Which table to print
        #[arg(long, value_enum, default_value_t = ShowTable::Build)]
        table: ShowTable,
    },
    /// Write a starter config and rules file to the user config dir
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowTable {
    Base,
    Build,
    User,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub command: Command,
    pub config: BuilderConfig,
    /// Where `config` came from, for `init`
    pub config_path: Option<PathBuf>,
}

impl CliArgs {
    /// Resolve the config file and apply command-line overrides
    pub fn into_config(self) -> Result<StartupConfig, String> {
        let mut config = match self.config {
            Some(ref path) if !path.exists() && !matches!(self.command, Some(Command::Init { .. })) => {
                return Err(format!("Config file not found: {}", path.display()));
            }
            Some(ref path) => BuilderConfig::load_from(path),
            None => BuilderConfig::load(),
        };
        self.apply_overrides(&mut config)?;

        Ok(StartupConfig {
            command: self.command.unwrap_or(Command::Rebuild),
            config,
            config_path: self.config,
        })
    }

    fn apply_overrides(&self, config: &mut BuilderConfig) -> Result<(), String> {
        for path in [&self.base, &self.rules].into_iter().flatten() {
            if !path.exists() {
                return Err(format!("File not found: {}", path.display()));
            }
        }
        if let Some(ref base) = self.base {
            config.base_keyconfig = Some(base.clone());
        }
        if let Some(ref rules) = self.rules {
            config.rules_file = Some(rules.clone());
        }
        if let Some(ref presets) = self.presets {
            config.presets_dir = Some(presets.clone());
        }
        Ok(())
    }
}

impl StartupConfig {
    /// Load the base snapshot: configured file, else the embedded one
    pub fn load_base(&self) -> Result<Keyconfig, KeymapError> {
        match self.config.base_keyconfig {
            Some(ref path) => load_keyconfig_file(path, KeyconfigKind::Default),
            None => default_base_keyconfig(),
        }
    }

    /// Load the layered default rules plus the configured rules file
    pub fn load_rules(&self) -> Result<RuleSet, KeymapError> {
        let rules = load_default_rules();
        match self.config.rules_file {
            Some(ref path) => Ok(merge_rules(rules, load_rules_file(path)?)),
            None => Ok(rules),
        }
    }

    /// Register a session from the resolved config
    pub fn load_session(&self) -> Result<Session, KeymapError> {
        let base = self.load_base()?;
        let rules = self.load_rules()?;
        Ok(Session::register(self.config.clone(), base, rules))
    }
}

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;

use keyconfig_builder::cli::{CliArgs, Command, ShowTable, StartupConfig};
use keyconfig_builder::config::BuilderConfig;
use keyconfig_builder::config_paths;
use keyconfig_builder::keymap::{export_keyconfig, Keyconfig, TableRef};
use keyconfig_builder::pipeline::{self, BuildStage};
use keyconfig_builder::{Msg, Runtime, Session};

/// Starter user rules; an empty layer on top of the embedded defaults
const STARTER_RULES: &str = r#"# Extra keyconfig rules, layered on top of the built-in ones.
#
# blocks:
#   - name: my_tweaks
#     rules:
#       - add:
#           keymap: 3D View
#           action: {wm.call_menu_pie: {name: VIEW3D_MT_view_pie}}
#           hotkey: "Q alt"
#       - disable:
#           keymap: Window
#           action: wm.quit_blender
blocks: []
"#;

fn main() -> Result<()> {
    keyconfig_builder::tracing::init();

    let args = CliArgs::parse();
    let startup = args.into_config().map_err(anyhow::Error::msg)?;

    match startup.command.clone() {
        Command::Rebuild => rebuild(&startup),
        Command::Check => check(&startup),
        Command::Show { context, table } => show(&startup, context.as_deref(), table),
        Command::Init { force } => init(&startup, force),
    }
}

fn load_session(startup: &StartupConfig) -> Result<Session> {
    startup
        .load_session()
        .context("Failed to load base keyconfig or rules")
}

fn rebuild(startup: &StartupConfig) -> Result<()> {
    let mut runtime = Runtime::new(load_session(startup)?);
    runtime.dispatch(Msg::rebuild());
    runtime.run_until_idle();

    for report in runtime.take_reports() {
        println!("{}", report);
    }
    let Some(ref build) = runtime.session.build else {
        bail!("No keyconfig was built");
    };
    println!("{}", build);
    if build.stage() != BuildStage::Persisted {
        bail!("Build stopped at {}", build.stage());
    }
    Ok(())
}

/// Run every step except persistence
fn build_in_memory(session: &mut Session) -> Result<()> {
    pipeline::run_synchronous(session)?;
    pipeline::apply_integrations(session)?;
    pipeline::prune(session)?;
    Ok(())
}

fn check(startup: &StartupConfig) -> Result<()> {
    let mut session = load_session(startup)?;
    println!(
        "Rules: {} blocks, {} directives; {} integrations, {} directives; {} add-on bindings",
        session.rules.blocks.len(),
        session.rules.directive_count(),
        session.rules.integrations.len(),
        session.rules.integration_directive_count(),
        session.overlay_len()
    );
    build_in_memory(&mut session)?;
    if let Some(ref build) = session.build {
        println!("{}", build);
    }
    Ok(())
}

fn show(startup: &StartupConfig, context: Option<&str>, table: ShowTable) -> Result<()> {
    let mut session = load_session(startup)?;
    let keyconfig = match table {
        ShowTable::Base => session.store.default_keyconfig(),
        ShowTable::User => {
            build_in_memory(&mut session)?;
            session.store.user()
        }
        ShowTable::Build => {
            build_in_memory(&mut session)?;
            let name = session.keyconfig_name();
            session
                .store
                .get(&TableRef::Named(name.clone()))
                .with_context(|| format!("Keyconfig '{}' was not built", name))?
        }
    };

    let yaml = match context {
        Some(name) => {
            let ctx = keyconfig
                .context(name)
                .with_context(|| format!("No keymap named '{}' in '{}'", name, keyconfig.name))?;
            let single = Keyconfig::new(keyconfig.name.clone(), keyconfig.kind)
                .with_context(ctx.clone_fresh());
            export_keyconfig(&single)?
        }
        None => export_keyconfig(keyconfig)?,
    };
    print!("{}", yaml);
    Ok(())
}

fn init(startup: &StartupConfig, force: bool) -> Result<()> {
    let config_path = match startup.config_path {
        Some(ref path) => path.clone(),
        None => config_paths::config_file().context("No config directory available")?,
    };
    write_starter(&config_path, force, |path| {
        BuilderConfig::default().save_to(path)
    })?;

    let rules_path = config_paths::rules_file().context("No config directory available")?;
    write_starter(&rules_path, force, |path| {
        if let Some(parent) = path.parent() {
            config_paths::ensure_dir(parent)?;
        }
        std::fs::write(path, STARTER_RULES).map_err(|e| e.to_string())
    })
}

fn write_starter(
    path: &Path,
    force: bool,
    write: impl FnOnce(&Path) -> Result<(), String>,
) -> Result<()> {
    if path.exists() && !force {
        println!("{} already exists, leaving it (use --force)", path.display());
        return Ok(());
    }
    write(path).map_err(anyhow::Error::msg)?;
    println!("Wrote {}", path.display());
    Ok(())
}

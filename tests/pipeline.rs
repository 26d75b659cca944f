//! End-to-end rebuild tests
//!
//! Drive a session through the runtime and check what lands on disk and in
//! each table.

mod common;

use common::*;
use keyconfig_builder::keymap::{
    export_path, load_keyconfig_file, parse_rules_yaml, KeyconfigKind, TableRef,
    DEFAULT_KEYCONFIG_NAME,
};
use keyconfig_builder::pipeline::{BuildStage, Preferences};
use keyconfig_builder::Msg;

// ========================================================================
// Full pipeline
// ========================================================================

#[test]
fn test_rebuild_persists_export_and_preferences() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = embedded_runtime(dir.path(), &["node_wrangler"]);

    runtime.dispatch(Msg::rebuild());
    runtime.run_until_idle();

    let state = runtime.session.build.as_ref().unwrap();
    assert_eq!(state.stage(), BuildStage::Persisted);
    assert!(state.rules.param_failures.is_empty());

    let export = export_path(&dir.path().join("presets"), DEFAULT_KEYCONFIG_NAME);
    assert!(export.ends_with("keyconfig/Sugar_Keyconfig.yaml"));
    assert_eq!(state.export_path.as_deref(), Some(export.as_path()));

    let reports = runtime.take_reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].starts_with("Exported keyconfig to"));

    let exported = load_keyconfig_file(&export, KeyconfigKind::Build).unwrap();
    assert_eq!(exported.name, DEFAULT_KEYCONFIG_NAME);
    assert!(exported.iter_records().all(|(_, r)| r.active));

    let build = runtime
        .session
        .store
        .get(&TableRef::Named(DEFAULT_KEYCONFIG_NAME.into()))
        .unwrap();
    assert_eq!(exported.record_count(), build.record_count());

    let preferences: Preferences =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("userpref.json")).unwrap())
            .unwrap();
    assert_eq!(
        preferences.active_keyconfig.as_deref(),
        Some(DEFAULT_KEYCONFIG_NAME)
    );
}

#[test]
fn test_export_has_no_inactive_records() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = embedded_runtime(dir.path(), &[]);
    runtime.dispatch(Msg::rebuild());
    runtime.run_until_idle();

    let build = runtime.session.store.get(&TableRef::Active).unwrap();
    assert_eq!(build.active_count(), build.record_count());
    assert!(runtime.session.build.as_ref().unwrap().pruned > 0);

    // Swept, and not restored by any exception
    assert!(find(build, "Window", "wm.open_mainfile", Some("O cmd")).is_none());
    assert!(find(build, "Window", "wm.open_mainfile", Some("O ctrl")).is_some());
    // Exception keeps the common shortcut
    assert!(find(build, "Window", "wm.save_mainfile", Some("S cmd")).is_some());
}

#[test]
fn test_default_table_untouched_by_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = embedded_runtime(dir.path(), &["node_wrangler"]);
    let before = runtime.session.store.default_keyconfig().record_count();

    runtime.dispatch(Msg::rebuild());
    runtime.run_until_idle();

    let default = runtime.session.store.default_keyconfig();
    assert_eq!(default.record_count(), before);
    assert_eq!(default.active_count(), before);
}

// ========================================================================
// Integrations
// ========================================================================

#[test]
fn test_enabled_integration_edits_user_table_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = embedded_runtime(dir.path(), &["node_wrangler"]);
    let align = find(
        runtime.session.store.user(),
        "Node Editor",
        "node.nw_align_nodes",
        Some("EQUAL shift"),
    )
    .unwrap()
    .id;

    runtime.dispatch(Msg::rebuild());
    runtime.run_until_idle();

    let user = runtime.session.store.user();
    let (context, record) = user.find_by_id(align).unwrap();
    assert_eq!(context, "Node Editor");
    assert_eq!(record.trigger, hotkey("A ctrl"));
    assert!(find(user, "Node Editor", "node.nw_align_nodes", Some("EQUAL shift")).is_none());

    let state = runtime.session.build.as_ref().unwrap();
    assert_eq!(state.integrations_applied, vec!["node_wrangler".to_string()]);
}

#[test]
fn test_disabled_integration_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = embedded_runtime(dir.path(), &[]);

    runtime.dispatch(Msg::rebuild());
    runtime.run_until_idle();

    let user = runtime.session.store.user();
    assert!(find(user, "Node Editor", "node.nw_align_nodes", Some("EQUAL shift")).is_some());
    assert!(find(user, "Mesh", "mesh.f2", Some("F")).is_some());

    let state = runtime.session.build.as_ref().unwrap();
    assert!(state.integrations_applied.is_empty());
    assert!(state.integrations_skipped.contains(&"node_wrangler".to_string()));
    assert!(state.integrations_skipped.contains(&"mesh_f2".to_string()));
    assert_eq!(state.integrations.total(), 0);
}

#[test]
fn test_integrations_leave_build_table_alone() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = embedded_runtime(dir.path(), &["mesh_f2"]);
    runtime.dispatch(Msg::rebuild());
    runtime.run_until_idle();

    let user = runtime.session.store.user();
    assert!(find(user, "Mesh", "mesh.f2", Some("F alt")).is_some());

    let build = runtime.session.store.get(&TableRef::Active).unwrap();
    assert!(find(build, "Mesh", "mesh.f2", Some("F alt")).is_none());
}

// ========================================================================
// Ordering and supersession
// ========================================================================

#[test]
fn test_deferred_steps_run_one_tick_at_a_time() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = embedded_runtime(dir.path(), &[]);

    runtime.dispatch(Msg::rebuild());
    let stage = |runtime: &keyconfig_builder::Runtime| runtime.session.build.as_ref().unwrap().stage();
    assert_eq!(stage(&runtime), BuildStage::RulesApplied);

    assert_eq!(runtime.tick(), 1);
    assert_eq!(stage(&runtime), BuildStage::IntegrationsApplied);
    assert_eq!(runtime.tick(), 1);
    assert_eq!(stage(&runtime), BuildStage::Pruned);

    runtime.run_until_idle();
    assert_eq!(stage(&runtime), BuildStage::Persisted);
}

#[test]
fn test_second_rebuild_replaces_build_table() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = embedded_runtime(dir.path(), &[]);

    runtime.dispatch(Msg::rebuild());
    runtime.dispatch(Msg::rebuild());
    runtime.run_until_idle();

    assert_eq!(runtime.session.store.build_names().count(), 1);
    let state = runtime.session.build.as_ref().unwrap();
    assert_eq!(state.generation, runtime.session.generation());
    assert_eq!(state.stage(), BuildStage::Persisted);
    assert_eq!(runtime.take_reports().len(), 1);
}

#[test]
fn test_unregister_drops_pending_steps() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = embedded_runtime(dir.path(), &["node_wrangler"]);

    runtime.dispatch(Msg::rebuild());
    runtime.session.unregister();
    runtime.run_until_idle();

    assert!(runtime.session.build.is_none());
    assert!(!dir.path().join("presets").exists());
    assert!(find(
        runtime.session.store.user(),
        "Node Editor",
        "node.nw_align_nodes",
        Some("EQUAL shift")
    )
    .is_some());
}

// ========================================================================
// Custom rules
// ========================================================================

const SMALL_BASE: &str = r#"
name: Blender
keymaps:
  - name: Mesh
    items:
      - {action: mesh.select_all, params: {action: TOGGLE}, hotkey: "A"}
      - {action: mesh.select_all, params: {action: INVERT}, hotkey: "I ctrl"}
  - name: Node Editor
    items:
      - {action: node.nw_align_nodes, hotkey: "EQUAL shift"}
"#;

#[test]
fn test_custom_rules_drive_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let rules = parse_rules_yaml(
        r#"
name: Small Keyconfig
sweep: {include: [ctrl]}
blocks:
  - name: mesh
    rules:
      - add: {keymap: Mesh, action: mesh.select_all, hotkey: "A DOUBLE_CLICK", disable_old: "A", set: {action: SELECT}}
      - add: {keymap: Mesh, action: mesh.select_all, hotkey: "I alt", set: {action: INVERT}}
integrations:
  - addon: node_wrangler
    rules:
      - edit: {keymap: Node Editor, action: node.nw_align_nodes, hotkey: "A ctrl", old_hotkey: "EQUAL shift"}
"#,
    )
    .unwrap();
    let session = session_from_yaml(test_config(dir.path(), &["node_wrangler"]), SMALL_BASE, rules);
    let mut runtime = keyconfig_builder::Runtime::new(session);

    runtime.dispatch(Msg::rebuild());
    runtime.run_until_idle();

    let exported = load_keyconfig_file(
        &export_path(&dir.path().join("presets"), "Small Keyconfig"),
        KeyconfigKind::Build,
    )
    .unwrap();
    let mesh = exported.context("Mesh").unwrap();
    let hotkeys: Vec<String> = mesh.items.iter().map(|r| r.trigger.to_string()).collect();
    assert_eq!(hotkeys, vec!["A DOUBLE_CLICK", "I alt"]);

    assert_eq!(active_count(runtime.session.store.user(), "Node Editor", "node.nw_align_nodes"), 1);
    assert!(find(runtime.session.store.user(), "Node Editor", "node.nw_align_nodes", Some("A ctrl")).is_some());
}

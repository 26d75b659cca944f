//! Reconciliation scenarios across the keymap modules

use super::*;

fn trigger(descriptor: &str) -> Trigger {
    parse_hotkey(descriptor).unwrap()
}

fn add(context: &str, action: ActionRef, hotkey: &str, replace: Replace) -> Directive {
    Directive::Add(AddDirective {
        context: context.to_string(),
        action,
        trigger: trigger(hotkey),
        setters: Vec::new(),
        replace,
    })
}

fn records_for<'a>(keyconfig: &'a Keyconfig, context: &str, action: &str) -> Vec<&'a BindingRecord> {
    keyconfig
        .context(context)
        .map(|c| c.items.iter().filter(|r| r.action.id == action).collect())
        .unwrap_or_default()
}

fn base() -> Keyconfig {
    let mut mesh = KeyContext::new("Mesh");
    mesh.insert(ActionRef::new("mesh.select_all"), trigger("A"));
    mesh.insert(
        ActionRef::new("mesh.select_all").param("action", "INVERT"),
        trigger("I ctrl"),
    );
    let mut window = KeyContext::new("Window");
    window.insert(ActionRef::new("wm.save_mainfile"), trigger("S cmd"));
    window.insert(ActionRef::new("wm.open_mainfile"), trigger("O cmd"));
    window.insert(ActionRef::new("wm.search_menu"), trigger("F3"));
    Keyconfig::new("Blender", KeyconfigKind::Default)
        .with_context(mesh)
        .with_context(window)
}

#[test]
fn test_clone_fidelity() {
    let mut store = KeyconfigStore::from_default(base());
    let default_ids: Vec<BindingId> = store.default_keyconfig().iter_records().map(|(_, r)| r.id).collect();

    let build = store.new_build_keyconfig("Sugar Keyconfig");
    assert_eq!(build.kind, KeyconfigKind::Build);

    let base = base();
    for (context, record) in base.iter_records() {
        let found = build
            .context(context)
            .unwrap()
            .items
            .iter()
            .any(|r| r.same_values(record));
        assert!(found, "missing {} in {}", record, context);
    }
    for (_, record) in build.iter_records() {
        assert!(!default_ids.contains(&record.id));
    }
}

#[test]
fn test_disable_before_add_leaves_one_active() {
    let mut build = base();
    let directive = add(
        "Window",
        ActionRef::new("wm.search_menu"),
        "SPACE ctrl",
        Replace::FirstByAction,
    );
    assert_eq!(
        apply(&mut build, &directive, &ParamSchema::new()),
        DirectiveOutcome::Applied
    );

    let active: Vec<_> = records_for(&build, "Window", "wm.search_menu")
        .into_iter()
        .filter(|r| r.active)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].trigger, trigger("SPACE ctrl"));
}

#[test]
fn test_chained_replacements_leave_latest_active() {
    let mut build = base();
    let schema = ParamSchema::new();
    for hotkey in ["A DOUBLE_CLICK", "A shift DOUBLE_CLICK"] {
        let directive = add("Mesh", ActionRef::new("mesh.select_all"), hotkey, Replace::FirstByAction);
        assert_eq!(apply(&mut build, &directive, &schema), DirectiveOutcome::Applied);
    }

    // Each replacement deactivates one live record, never a dead one
    let active: Vec<String> = records_for(&build, "Mesh", "mesh.select_all")
        .into_iter()
        .filter(|r| r.active)
        .map(|r| r.trigger.to_string())
        .collect();
    assert_eq!(active, vec!["A shift DOUBLE_CLICK".to_string()]);
}

#[test]
fn test_replacement_after_sweep_targets_live_record() {
    let mut mesh = KeyContext::new("Mesh");
    mesh.insert(ActionRef::new("mesh.select_all"), trigger("A cmd"));
    mesh.insert(ActionRef::new("mesh.select_all"), trigger("A"));
    let mut build = Keyconfig::new("Build", KeyconfigKind::Build).with_context(mesh);

    sweep(&mut build, &SweepSpec::new(vec!["cmd".into()], Vec::new()));
    let directive = add(
        "Mesh",
        ActionRef::new("mesh.select_all"),
        "A DOUBLE_CLICK",
        Replace::FirstByAction,
    );
    apply(&mut build, &directive, &ParamSchema::new());

    let active: Vec<String> = records_for(&build, "Mesh", "mesh.select_all")
        .into_iter()
        .filter(|r| r.active)
        .map(|r| r.trigger.to_string())
        .collect();
    assert_eq!(active, vec!["A DOUBLE_CLICK".to_string()]);
}

#[test]
fn test_sweep_honors_exceptions() {
    let mut window = KeyContext::new("Window");
    window.insert(ActionRef::new("ed.select_all"), trigger("A ctrl"));
    window.insert(ActionRef::new("ed.bake"), trigger("B ctrl"));
    let mut build = Keyconfig::new("Build", KeyconfigKind::Build).with_context(window);

    let spec = SweepSpec::new(vec!["ctrl".into()], vec!["A ctrl".into()]);
    assert_eq!(sweep(&mut build, &spec), 1);

    let window = build.context("Window").unwrap();
    assert!(window.items[0].active);
    assert!(!window.items[1].active);
}

#[test]
fn test_sweep_exceptions_cover_repeat_and_phase_variants() {
    let mut window = KeyContext::new("Window");
    window.insert(ActionRef::new("ed.undo"), trigger("Z cmd repeat"));
    window.insert(ActionRef::new("mesh.select_all"), trigger("A cmd CLICK"));
    window.insert(ActionRef::new("wm.open_mainfile"), trigger("O cmd"));
    let mut build = Keyconfig::new("Build", KeyconfigKind::Build).with_context(window);

    let spec = SweepSpec::new(vec!["cmd".into()], vec!["Z cmd".into(), "A cmd".into()]);
    assert_eq!(sweep(&mut build, &spec), 1);

    let window = build.context("Window").unwrap();
    assert!(window.items[0].active);
    assert!(window.items[1].active);
    assert!(!window.items[2].active);
}

#[test]
fn test_sweep_by_modifier_flag() {
    let mut build = base();
    let spec = SweepSpec::new(vec!["cmd".into()], vec!["S cmd".into()]);
    assert_eq!(sweep(&mut build, &spec), 1);
    assert!(build
        .find_first("Window", &ActionPattern::id("wm.save_mainfile"), None)
        .unwrap()
        .active);
    assert!(!build
        .find_first("Window", &ActionPattern::id("wm.open_mainfile"), None)
        .unwrap()
        .active);
    // No modifier, no match
    assert!(build
        .find_first("Window", &ActionPattern::id("wm.search_menu"), None)
        .unwrap()
        .active);
}

#[test]
fn test_sweep_by_key_prefix() {
    let mut view = KeyContext::new("3D View");
    view.insert(ActionRef::new("view3d.view_axis"), trigger("NUMPAD_1"));
    view.insert(ActionRef::new("view3d.ndof_orbit"), trigger("NDOF_MOTION"));
    view.insert(ActionRef::new("view3d.select"), trigger("LEFTMOUSE"));
    let mut build = Keyconfig::new("Build", KeyconfigKind::Build).with_context(view);

    let spec = SweepSpec::new(vec!["Numpad".into(), "NDOF".into()], Vec::new());
    assert_eq!(sweep(&mut build, &spec), 2);
    assert_eq!(build.active_count(), 1);
}

#[test]
fn test_wildcard_disable_across_contexts() {
    let mut build = Keyconfig::new("Build", KeyconfigKind::Build);
    for (context, prefix) in [("3D View", "view3d"), ("Image", "image"), ("View2D", "view2d")] {
        let mut ctx = KeyContext::new(context);
        ctx.insert(
            ActionRef::new(format!("{}.zoom_border", prefix)).param("zoom_out", false),
            trigger("B shift"),
        );
        ctx.insert(ActionRef::new(format!("{}.select_box", prefix)), trigger("B"));
        build.contexts.push(ctx);
    }

    let directive = Directive::Disable(DisableDirective {
        context: ContextPattern::All,
        action: ActionPattern::parse("*.zoom_border", None),
        trigger: Some(trigger("B shift")),
    });
    assert_eq!(
        apply(&mut build, &directive, &ParamSchema::new()),
        DirectiveOutcome::Applied
    );

    for (_, record) in build.iter_records() {
        assert_eq!(record.active, !record.action.id.ends_with(".zoom_border"));
    }
    assert_eq!(build.active_count(), 3);
}

#[test]
fn test_wildcard_disable_without_trigger() {
    let mut build = base();
    let directive = Directive::Disable(DisableDirective {
        context: ContextPattern::All,
        action: ActionPattern::parse("*.select_all", None),
        trigger: None,
    });
    apply(&mut build, &directive, &ParamSchema::new());
    assert!(records_for(&build, "Mesh", "mesh.select_all")
        .iter()
        .all(|r| !r.active));
}

#[test]
fn test_pruning_is_terminal() {
    let mut build = base();
    let inactive = build.context("Mesh").unwrap().items[1].id;
    build.set_active(inactive, false);

    assert_eq!(build.prune_inactive(), 1);
    assert!(build.find_by_id(inactive).is_none());
    assert!(build
        .find_first("*", &ActionPattern::Any, Some(&trigger("I ctrl")))
        .is_none());
    assert!(build.iter_records().all(|(_, r)| r.active));
}

#[test]
fn test_parse_canonical_descriptor() {
    let parsed = trigger("D ctrl alt DOUBLE_CLICK repeat");
    assert_eq!(parsed.key, "D");
    assert_eq!(parsed.modifiers, Modifiers::CTRL | Modifiers::ALT);
    assert_eq!(parsed.value, InputValue::DoubleClick);
    assert!(parsed.repeat);

    let printed = parsed.to_string();
    let mut expected: Vec<&str> = "D ctrl alt DOUBLE_CLICK repeat".split(' ').collect();
    let mut actual: Vec<&str> = printed.split(' ').collect();
    expected.sort_unstable();
    actual.sort_unstable();
    assert_eq!(actual, expected);
}

#[test]
fn test_scenario_add_replaces_old_hotkey() {
    let mut build = Keyconfig::new("Build", KeyconfigKind::Build).with_context({
        let mut mesh = KeyContext::new("Mesh");
        mesh.insert(ActionRef::new("mesh.select_all"), trigger("A"));
        mesh
    });

    let directive = add(
        "Mesh",
        ActionRef::new("mesh.select_all"),
        "A DOUBLE_CLICK",
        Replace::Hotkeys(vec![trigger("A")]),
    );
    apply(&mut build, &directive, &ParamSchema::new());

    let records = records_for(&build, "Mesh", "mesh.select_all");
    assert_eq!(records.len(), 2);
    assert!(!records[0].active);
    assert_eq!(records[0].trigger, trigger("A"));
    assert!(records[1].active);
    assert_eq!(records[1].trigger, trigger("A DOUBLE_CLICK"));

    build.prune_inactive();
    assert_eq!(records_for(&build, "Mesh", "mesh.select_all").len(), 1);
}

#[test]
fn test_scenario_edit_keeps_identity() {
    let mut nodes = KeyContext::new("Node Editor");
    let align = nodes.insert(ActionRef::new("node.nw_align_nodes"), trigger("EQUAL shift"));
    nodes.insert(ActionRef::new("node.select"), trigger("LEFTMOUSE"));
    let mut user = Keyconfig::new("Blender user", KeyconfigKind::User).with_context(nodes);

    let directive = Directive::Edit(EditDirective {
        context: "Node Editor".into(),
        action: ActionRef::new("node.nw_align_nodes"),
        trigger: trigger("A ctrl"),
        old: EditTarget::Hotkey(trigger("EQUAL shift")),
    });
    assert_eq!(
        apply(&mut user, &directive, &ParamSchema::new()),
        DirectiveOutcome::Applied
    );

    let (_, record) = user.find_by_id(align).unwrap();
    assert_eq!(record.trigger, trigger("A ctrl"));
    assert_eq!(user.record_count(), 2);

    // The old hotkey is gone, so a second run finds nothing to edit
    assert_eq!(
        apply(&mut user, &directive, &ParamSchema::new()),
        DirectiveOutcome::LookupMiss
    );
}

#[test]
fn test_rules_yaml_to_export() {
    let rules = parse_rules_yaml(
        r#"
name: Test Keyconfig
sweep: {include: [cmd], exceptions: ["S cmd"]}
blocks:
  - name: mesh
    rules:
      - add:
          keymap: Mesh
          action: mesh.select_all
          hotkey: "A DOUBLE_CLICK"
          disable_old: "A"
          set: {action: SELECT}
      - disable: {keymap: "*", action: "*.open_mainfile"}
"#,
    )
    .unwrap();

    let mut store = KeyconfigStore::from_default(base());
    let build = store.new_build_keyconfig("Test Keyconfig");
    let swept = sweep(build, rules.sweep.as_ref().unwrap());
    assert_eq!(swept, 1);

    let report = apply_all(build, &rules.blocks[0].directives, &rules.schema);
    assert_eq!(report.applied, 1);
    assert_eq!(report.misses, 1);
    assert!(report.param_failures.is_empty());

    build.prune_inactive();
    let yaml = export_keyconfig(build).unwrap();
    let reloaded = parse_keyconfig_yaml(&yaml, KeyconfigKind::Build).unwrap();

    let mesh: Vec<_> = records_for(&reloaded, "Mesh", "mesh.select_all");
    assert_eq!(mesh.len(), 2);
    assert_eq!(mesh[1].action.get_param("action"), Some(&ParamValue::from("SELECT")));
    assert!(reloaded
        .find_first("Window", &ActionPattern::id("wm.open_mainfile"), None)
        .is_none());
}

#[test]
fn test_embedded_rules_apply_to_embedded_base() {
    let rules = default_rules().unwrap();
    let mut store = KeyconfigStore::from_default(default_base_keyconfig().unwrap());
    let build = store.new_build_keyconfig(DEFAULT_KEYCONFIG_NAME);

    let swept = sweep(build, rules.sweep.as_ref().unwrap());
    assert!(swept > 0);
    // Common editing shortcuts survive the sweep
    assert!(build
        .find_first("Window", &ActionPattern::id("wm.save_mainfile"), Some(&trigger("S cmd")))
        .unwrap()
        .active);

    let mut report = ApplyReport::default();
    for block in &rules.blocks {
        report.merge(apply_all(build, &block.directives, &rules.schema));
    }
    assert!(report.param_failures.is_empty(), "{:?}", report.param_failures);
    assert!(report.applied > 50);

    let expand = build
        .find_first("Sculpt", &ActionPattern::id("sculpt.expand"), Some(&trigger("Q ctrl")))
        .unwrap();
    assert_eq!(
        expand.action.get_param("falloff_type"),
        Some(&ParamValue::from("TOPOLOGY_DIAGONALS"))
    );

    let rip = build
        .find_first("Mesh", &ActionPattern::id("mesh.rip_move"), Some(&trigger("V shift alt")))
        .unwrap();
    assert_eq!(
        rip.action.get_param("MESH_OT_rip.use_fill"),
        Some(&ParamValue::Bool(true))
    );
}

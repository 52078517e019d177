//! End-to-end tests for the command layer: save, list, apply, paste,
//! ghost and delete against a temporary library and scene files.

use pretty_assertions::assert_eq;
use std::fs;
use std::process::ExitCode;

use posekit_cli::catalog::{filter_entries, Catalog};
use posekit_cli::commands;
use posekit_cli::commands::apply::ModeArg;
use posekit_cli::commands::save::SaveOptions;
use posekit_cli::config::PosekitConfig;
use posekit_cli::scene::Scene;
use posekit_core::{PoseDialect, RigHost};
use posekit_tests::harness::TEST_PROJECT;
use posekit_tests::{arm_pose, standard_rig, standard_scene_json, TestLibrary};

fn posed_rig() -> posekit_core::MemoryRig {
    let mut rig = standard_rig();
    for snapshot in arm_pose() {
        for (attribute, value) in snapshot.iter() {
            rig.set_attr(&snapshot.control, attribute, value).unwrap();
        }
    }
    rig
}

#[test]
fn test_save_then_list() {
    let library = TestLibrary::new();
    let cli = library.cli_library();
    let scene = library.write_scene(
        "shot",
        &posed_rig().with_selection(["fk_wrist_l_anim", "fk_arm_l_anim"]),
    );

    let full = SaveOptions {
        category: Some("Arms"),
        ..Default::default()
    };
    let partial = SaveOptions {
        category: Some("Arms"),
        selection: true,
        ..Default::default()
    };
    assert_eq!(commands::save::run(&cli, &scene, "reach", &full).unwrap(), ExitCode::SUCCESS);
    assert_eq!(commands::save::run(&cli, &scene, "reach", &partial).unwrap(), ExitCode::SUCCESS);
    assert_eq!(commands::save::run(&cli, &scene, "wave", &full).unwrap(), ExitCode::SUCCESS);

    let catalog = Catalog::new(&library.store);
    assert_eq!(catalog.projects(), vec![TEST_PROJECT.to_string()]);
    assert_eq!(catalog.categories(TEST_PROJECT), vec!["Arms".to_string()]);

    let poses = catalog.poses(TEST_PROJECT, "Arms");
    let listed: Vec<(&str, PoseDialect)> = poses.iter().map(|p| (p.name.as_str(), p.dialect)).collect();
    assert_eq!(
        listed,
        vec![
            ("reach", PoseDialect::Full),
            ("reach", PoseDialect::Partial),
            ("wave", PoseDialect::Full),
        ]
    );

    let partial_record = library.store.load_record(&poses[1].path).unwrap();
    assert_eq!(partial_record.snapshots.len(), 2);

    let waves = filter_entries(catalog.all_poses(TEST_PROJECT), "WAV");
    assert_eq!(waves.len(), 1);
    assert_eq!(
        commands::catalog::run_list(&cli, None, Some("reach")).unwrap(),
        ExitCode::SUCCESS
    );
}

#[test]
fn test_apply_by_name_writes_scene() {
    let library = TestLibrary::new();
    let cli = library.cli_library();
    library.save("reach", "Arms", arm_pose(), false);
    let scene = library.write_scene("shot", &standard_rig());

    let code = commands::apply::run(
        &PosekitConfig::default(),
        &cli,
        &scene,
        "reach",
        Some("Arms"),
        ModeArg::Exact,
        false,
    )
    .unwrap();

    assert_eq!(code, ExitCode::SUCCESS);
    let rig = library.read_scene(&scene);
    assert_eq!(rig.value("ik_wrist_l_anim", "ry"), Some(30.0));
    assert_eq!(rig.value("fk_arm_l_anim", "rz"), Some(35.0));
    assert!(rig.keys_for("hip_anim", "tx").next().is_some());
}

#[test]
fn test_partial_pose_resolves_by_name() {
    let library = TestLibrary::new();
    let cli = library.cli_library();
    library.save("grip", "Hands", arm_pose(), true);
    let mut rig = standard_rig();
    rig.set_attr("body_anim", "tx", 3.0).unwrap();
    let scene = library.write_scene("shot", &rig);

    let path = cli.resolve_pose("grip", Some("Hands")).unwrap();
    assert!(path.ends_with("grip__SelectionOnly.json"));

    commands::apply::run(
        &PosekitConfig::default(),
        &cli,
        &scene,
        "grip",
        Some("Hands"),
        ModeArg::Partial,
        false,
    )
    .unwrap();

    let rig = library.read_scene(&scene);
    assert_eq!(rig.value("body_anim", "tx"), Some(3.0));
    assert_eq!(rig.value("fk_wrist_l_anim", "ry"), Some(45.0));
}

#[test]
fn test_paste_and_ghost_commands() {
    let library = TestLibrary::new();
    let cli = library.cli_library();
    let config = PosekitConfig::default();
    let path = library.save("reach", "Arms", arm_pose(), false);
    let pose = path.to_str().unwrap();

    let scene = library.write_scene("paste", &standard_rig());
    assert_eq!(
        commands::paste::run(&config, &cli, &scene, pose, None).unwrap(),
        ExitCode::SUCCESS
    );
    let rig = library.read_scene(&scene);
    assert_eq!(rig.value("ik_wrist_r_anim", "tx"), Some(-1.0));
    assert_eq!(rig.value("ik_wrist_r_anim", "ry"), Some(-30.0));
    assert_eq!(rig.value("hip_anim", "tx"), Some(0.0));

    let scene = library.write_scene("ghost", &standard_rig());
    assert_eq!(
        commands::ghost::run(&config, &cli, &scene, pose, None, false, true).unwrap(),
        ExitCode::SUCCESS
    );
    let rig = library.read_scene(&scene);
    assert!(rig.meshes.contains_key("reach_ghost"));
}

#[test]
fn test_delete_by_name() {
    let library = TestLibrary::new();
    let cli = library.cli_library();
    let path = library.save("wave", "Idle", arm_pose(), false);
    fs::write(library.store.thumbnail_for(&path), b"BM").unwrap();

    assert_eq!(
        commands::delete::run(&cli, "wave", Some("Idle"), false).unwrap(),
        ExitCode::SUCCESS
    );
    assert!(!path.exists());
    assert!(Catalog::new(&library.store).poses(TEST_PROJECT, "Idle").is_empty());
    assert!(commands::delete::run(&cli, "wave", Some("Idle"), false).is_err());
}

#[test]
fn test_default_category_from_config() {
    let library = TestLibrary::new();
    let config = PosekitConfig {
        default_category: "Blocking".to_string(),
        ..Default::default()
    };
    let cli = config
        .library_with(Some(library.path()), None, Some(TEST_PROJECT))
        .unwrap();
    let scene = library.write_scene("shot", &standard_rig());

    commands::save::run(&cli, &scene, "neutral", &SaveOptions::default()).unwrap();

    assert_eq!(
        Catalog::new(&library.store).categories(TEST_PROJECT),
        vec!["Blocking".to_string()]
    );
}

#[test]
fn test_scene_file_round_trips() {
    let library = TestLibrary::new();
    let path = library.path().join("hero.scene.json");
    fs::write(&path, standard_scene_json()).unwrap();

    let scene = Scene::load(&path).unwrap();
    let registry = scene.registry();
    assert!(registry.contains("hip_anim"));
    assert!(registry.is_space_switch("ik_wrist_l_anim_space_switcher"));

    scene.save().unwrap();
    assert_eq!(library.read_scene(&path), standard_rig());
}

//! Apply command implementation
//!
//! Applies a stored pose to a scene, optionally mirrored.

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;

use posekit_core::{ApplyMode, MirrorEngine, PoseApplier};

use super::reporting::{print_apply_report, print_mirror_report};
use crate::config::{Library, PosekitConfig};
use crate::scene::{LogProgress, PassthroughMatcher, Scene};

/// Application mode as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModeArg {
    Exact,
    Selection,
    Partial,
}

/// Run the apply command
///
/// # Arguments
/// * `config` - User configuration (mirror rule source)
/// * `library` - Resolved pose library
/// * `scene_path` - Scene to pose; written back on success
/// * `pose` - Pose name or record path
/// * `category` - Category of a named pose
/// * `mode` - Application mode
/// * `mirror` - Mirror the pose after applying it (exact mode only)
///
/// # Returns
/// Exit code: 0 success, 1 if any attribute write failed
pub fn run(
    config: &PosekitConfig,
    library: &Library,
    scene_path: &Path,
    pose: &str,
    category: Option<&str>,
    mode: ModeArg,
    mirror: bool,
) -> Result<ExitCode> {
    if mirror && mode != ModeArg::Exact {
        bail!("--mirror applies the pose exactly; it cannot be combined with --mode selection or partial");
    }

    let path = library.resolve_pose(pose, category)?;
    let snapshots = library.store.load(&path)?;
    let mut scene = Scene::load(scene_path)?;
    let registry = scene.registry();
    let applier = PoseApplier::new(&registry);
    let mut matcher = PassthroughMatcher;

    let failed = if mirror {
        println!("{} {} (mirrored)", "Applying:".cyan().bold(), path.display());
        let engine = MirrorEngine::new(config.rule_table()?);
        let report = engine.mirror_pose(
            &mut scene.rig,
            &applier,
            &snapshots,
            &mut matcher,
            &mut LogProgress::default(),
        );
        print_mirror_report(&report);
        report.failures.len() + report.apply.as_ref().map_or(0, |a| a.failed())
    } else {
        let mode = match mode {
            ModeArg::Exact => ApplyMode::Exact,
            ModeArg::Selection => {
                let selection = scene.selection();
                if selection.is_empty() {
                    bail!("Nothing is selected in {}", scene_path.display());
                }
                ApplyMode::Selection(selection)
            }
            ModeArg::Partial => ApplyMode::Partial,
        };
        println!(
            "{} {} ({})",
            "Applying:".cyan().bold(),
            path.display(),
            mode.name()
        );
        let report = applier.apply(&mut scene.rig, &snapshots, &mode, &mut matcher);
        print_apply_report(&report);
        report.failed()
    };

    scene.save()?;

    if failed > 0 {
        println!("{} {} write(s) failed", "WARNING".yellow().bold(), failed);
        Ok(ExitCode::from(1))
    } else {
        println!("{} Scene updated: {}", "SUCCESS".green().bold(), scene_path.display());
        Ok(ExitCode::SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posekit_core::{Control, DeclineAll, MemoryRig, Snapshot};
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Library, std::path::PathBuf) {
        let tmp = TempDir::new().unwrap();
        let scene = tmp.path().join("scene.json");
        let rig = MemoryRig::new()
            .with_control("fk_wrist_l_anim", Control::rotation().set("rx", 10.0))
            .with_control("fk_wrist_r_anim", Control::rotation())
            .with_control("hip_anim", Control::transform().set("tx", 3.0))
            .with_selection(["fk_wrist_l_anim"]);
        fs::write(&scene, rig.to_json_pretty().unwrap()).unwrap();

        let library = PosekitConfig::default()
            .library_with(Some(&tmp.path().join("lib")), None, Some("Hero"))
            .unwrap();
        let pose = vec![
            Snapshot::new("fk_wrist_l_anim")
                .with("rx", 0.0)
                .with("ry", 45.0)
                .with("rz", 0.0),
            Snapshot::new("hip_anim").with("ty", 2.0),
        ];
        library
            .store
            .save("reach", "No Category", "Hero", pose, false, &mut DeclineAll)
            .unwrap();
        (tmp, library, scene)
    }

    #[test]
    fn test_apply_exact_updates_scene() {
        let (_tmp, library, scene) = setup();
        let config = PosekitConfig::default();
        let code = run(&config, &library, &scene, "reach", None, ModeArg::Exact, false).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);

        let rig = Scene::load(&scene).unwrap().rig;
        assert_eq!(rig.value("fk_wrist_l_anim", "rx"), Some(0.0));
        assert_eq!(rig.value("fk_wrist_l_anim", "ry"), Some(45.0));
        assert_eq!(rig.value("hip_anim", "tx"), Some(0.0));
        assert_eq!(rig.value("hip_anim", "ty"), Some(2.0));
    }

    #[test]
    fn test_apply_selection_leaves_others() {
        let (_tmp, library, scene) = setup();
        let config = PosekitConfig::default();
        run(&config, &library, &scene, "reach", None, ModeArg::Selection, false).unwrap();

        let rig = Scene::load(&scene).unwrap().rig;
        assert_eq!(rig.value("fk_wrist_l_anim", "ry"), Some(45.0));
        assert_eq!(rig.value("hip_anim", "tx"), Some(3.0));
        assert_eq!(rig.value("hip_anim", "ty"), Some(0.0));
    }

    #[test]
    fn test_apply_mirrored() {
        let (_tmp, library, scene) = setup();
        let config = PosekitConfig::default();
        run(&config, &library, &scene, "reach", None, ModeArg::Exact, true).unwrap();

        let rig = Scene::load(&scene).unwrap().rig;
        assert_eq!(rig.value("fk_wrist_r_anim", "ry"), Some(45.0));
    }

    #[test]
    fn test_mirror_requires_exact() {
        let (_tmp, library, scene) = setup();
        let config = PosekitConfig::default();
        assert!(run(&config, &library, &scene, "reach", None, ModeArg::Partial, true).is_err());
    }
}

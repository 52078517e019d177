//! Save command implementation
//!
//! Captures the pose of a scene and stores it in the library.

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;

use posekit_core::{
    capture_full, capture_selection, validate_default_spaces, PoseError, SpaceSwitchPolicy,
};

use crate::config::Library;
use crate::scene::{FlagDelegate, Scene};

/// Options of the save command.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions<'a> {
    pub category: Option<&'a str>,
    /// Record only the scene's selected controls.
    pub selection: bool,
    /// Save even if space switches are outside their default spaces.
    pub skip_space_check: bool,
    pub force: bool,
    pub make_writable: bool,
}

/// Run the save command
///
/// # Arguments
/// * `library` - Resolved pose library
/// * `scene_path` - Scene to capture
/// * `name` - Pose name
/// * `options` - Category, dialect and prompt answers
///
/// # Returns
/// Exit code: 0 success, 1 refused or failed
pub fn run(
    library: &Library,
    scene_path: &Path,
    name: &str,
    options: &SaveOptions<'_>,
) -> Result<ExitCode> {
    if name.trim().is_empty() {
        bail!("Pose name must not be empty");
    }

    let scene = Scene::load(scene_path)?;
    let registry = scene.registry();

    if !options.skip_space_check {
        if let Err(PoseError::NonDefaultSpace { attributes }) =
            validate_default_spaces(&scene.rig, &registry, &SpaceSwitchPolicy::default())
        {
            println!(
                "{} Space switches must be in their default space before saving:",
                "REFUSED".red().bold()
            );
            for attribute in attributes {
                println!("  {} {}", "x".red(), attribute);
            }
            return Ok(ExitCode::from(1));
        }
    }

    let snapshots = if options.selection {
        let selection = scene.selection();
        if selection.is_empty() {
            bail!("Nothing is selected in {}", scene_path.display());
        }
        capture_selection(&scene.rig, &selection)
    } else {
        capture_full(&scene.rig, &registry)
    };
    if snapshots.is_empty() {
        bail!("No controls to record in {}", scene_path.display());
    }

    let category = library.category(options.category);
    println!(
        "{} {} ({} control(s)) -> {}/{}",
        "Saving:".cyan().bold(),
        name,
        snapshots.len(),
        library.project,
        category
    );

    let mut delegate = FlagDelegate::new(options.force, options.make_writable);
    match library.store.save(
        name,
        category,
        &library.project,
        snapshots,
        options.selection,
        &mut delegate,
    ) {
        Ok(path) => {
            println!("{} Saved to: {}", "SUCCESS".green().bold(), path.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(PoseError::Cancelled) => {
            println!(
                "{} Pose already exists; pass --force to overwrite",
                "CANCELLED".yellow().bold()
            );
            Ok(ExitCode::from(1))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PosekitConfig;
    use posekit_core::{Control, MemoryRig, PoseDialect};
    use std::fs;
    use tempfile::TempDir;

    fn setup(rig: MemoryRig) -> (TempDir, Library, std::path::PathBuf) {
        let tmp = TempDir::new().unwrap();
        let scene = tmp.path().join("scene.json");
        fs::write(&scene, rig.to_json_pretty().unwrap()).unwrap();
        let library = PosekitConfig::default()
            .library_with(Some(&tmp.path().join("lib")), None, Some("Hero"))
            .unwrap();
        (tmp, library, scene)
    }

    fn rig() -> MemoryRig {
        MemoryRig::new()
            .with_control("fk_wrist_l_anim", Control::rotation().set("ry", 45.0))
            .with_control("hip_anim", Control::transform())
            .with_selection(["fk_wrist_l_anim"])
    }

    #[test]
    fn test_save_full_then_refuse_overwrite() {
        let (_tmp, library, scene) = setup(rig());
        let code = run(&library, &scene, "wave", &SaveOptions::default()).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);

        let path = library.store.data_path(&library.location("wave", None, false));
        let record = library.store.load_record(&path).unwrap();
        assert_eq!(record.dialect, PoseDialect::Full);
        assert_eq!(record.category, "No Category");
        assert_eq!(record.snapshots.len(), 2);

        let code = run(&library, &scene, "wave", &SaveOptions::default()).unwrap();
        assert_eq!(code, ExitCode::from(1));

        let force = SaveOptions {
            force: true,
            ..Default::default()
        };
        assert_eq!(run(&library, &scene, "wave", &force).unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn test_save_selection_is_partial() {
        let (_tmp, library, scene) = setup(rig());
        let options = SaveOptions {
            selection: true,
            category: Some("Hands"),
            ..Default::default()
        };
        run(&library, &scene, "wave", &options).unwrap();

        let path = library
            .store
            .data_path(&library.location("wave", Some("Hands"), true));
        let snapshots = library.store.load(&path).unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].control, "fk_wrist_l_anim");
    }

    #[test]
    fn test_save_refuses_non_default_space() {
        let rig = rig()
            .with_control(
                "ik_wrist_l_anim_space_switcher",
                Control::new().attr("space_world", 0.0).attr("space_hip_anim", 1.0),
            )
            .with_node("ik_wrist_l_anim_space_switcher_follow");
        let (_tmp, library, scene) = setup(rig);
        let code = run(&library, &scene, "wave", &SaveOptions::default()).unwrap();
        assert_eq!(code, ExitCode::from(1));
        assert!(!library
            .store
            .data_path(&library.location("wave", None, false))
            .exists());
    }
}

//! Ghost command implementation
//!
//! Builds a ghost of a stored pose and snaps the rig onto it.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;

use posekit_core::{GhostOverlay, GhostVariant, MirrorEngine, PoseApplier, PoseError};

use super::reporting::print_snap_report;
use crate::config::{Library, PosekitConfig};
use crate::scene::{LogProgress, PassthroughMatcher, Scene};

/// Run the ghost command
///
/// A scene has no interactive step between building and snapping, so the
/// ghost is built, snapped to and discarded in one go. With `keep`, the
/// ghost is left in the scene instead and the rig is not snapped.
///
/// # Returns
/// Exit code: 0 success, 1 if the scene has no skinned geometry or a
/// control failed to snap
pub fn run(
    config: &PosekitConfig,
    library: &Library,
    scene_path: &Path,
    pose: &str,
    category: Option<&str>,
    mirror: bool,
    keep: bool,
) -> Result<ExitCode> {
    let path = library.resolve_pose(pose, category)?;
    let snapshots = library.store.load(&path)?;
    let mut scene = Scene::load(scene_path)?;
    let registry = scene.registry();
    let applier = PoseApplier::new(&registry);
    let engine = MirrorEngine::new(config.rule_table()?);
    let overlay = GhostOverlay::new(&applier, &engine);

    let variant = if mirror {
        GhostVariant::Mirrored
    } else {
        GhostVariant::Exact
    };
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("pose")
        .to_string();

    println!("{} {} ({:?})", "Ghosting:".cyan().bold(), name, variant);
    let mut progress = LogProgress::default();
    let ghost = match overlay.build(
        &mut scene.rig,
        &name,
        &snapshots,
        variant,
        &mut PassthroughMatcher,
        &mut progress,
    ) {
        Ok(ghost) => ghost,
        Err(PoseError::NoSkinnedGeometry) => {
            println!(
                "{} The scene has no skinned geometry to ghost",
                "FAILED".red().bold()
            );
            return Ok(ExitCode::from(1));
        }
        Err(e) => return Err(e.into()),
    };
    println!(
        "  {} ghost {} with {} marker(s)",
        "->".green(),
        ghost.mesh,
        ghost.markers.len()
    );

    if keep {
        scene.save()?;
        println!("{} Ghost kept in: {}", "SUCCESS".green().bold(), scene_path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let report = overlay.snap(&mut scene.rig, ghost, &mut progress)?;
    print_snap_report(&report);
    scene.save()?;

    if report.failures.is_empty() {
        println!("{} Scene updated: {}", "SUCCESS".green().bold(), scene_path.display());
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

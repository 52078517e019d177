//! Paste-opposite command implementation
//!
//! Writes a stored pose onto the opposite side of a scene.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;

use posekit_core::MirrorEngine;

use super::reporting::print_paste_report;
use crate::config::{Library, PosekitConfig};
use crate::scene::Scene;

/// Run the paste-opposite command
///
/// # Returns
/// Exit code: 0 success, 1 if nothing could be pasted
pub fn run(
    config: &PosekitConfig,
    library: &Library,
    scene_path: &Path,
    pose: &str,
    category: Option<&str>,
) -> Result<ExitCode> {
    let path = library.resolve_pose(pose, category)?;
    let snapshots = library.store.load(&path)?;
    let mut scene = Scene::load(scene_path)?;

    println!(
        "{} {} onto the opposite side",
        "Pasting:".cyan().bold(),
        path.display()
    );
    let engine = MirrorEngine::new(config.rule_table()?);
    let report = engine.paste_opposite(&mut scene.rig, &snapshots);
    print_paste_report(&report);

    if report.written() == 0 {
        println!("{} Nothing was pasted", "WARNING".yellow().bold());
        return Ok(ExitCode::from(1));
    }
    scene.save()?;
    println!("{} Scene updated: {}", "SUCCESS".green().bold(), scene_path.display());
    Ok(ExitCode::SUCCESS)
}

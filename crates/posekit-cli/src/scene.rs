//! Scene files and the command-line collaborators.
//!
//! A scene is a [`MemoryRig`] serialized as JSON. Commands load it, run a
//! core operation against it and write it back.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use posekit_core::{
    ControlRegistry, Decision, LimbMatcher, MatchRequest, MemoryRig, Progress, RigHost, RigResult,
    StoreDelegate,
};

/// A rig scene loaded from disk.
#[derive(Debug)]
pub struct Scene {
    pub path: PathBuf,
    pub rig: MemoryRig,
}

impl Scene {
    /// Loads a scene file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene: {}", path.display()))?;
        let rig = MemoryRig::from_json(&content)
            .with_context(|| format!("Failed to parse scene: {}", path.display()))?;
        debug!(path = %path.display(), controls = rig.controls.len(), "Loaded scene");
        Ok(Self {
            path: path.to_path_buf(),
            rig,
        })
    }

    /// Builds the control registry of the scene's rig.
    pub fn registry(&self) -> ControlRegistry {
        ControlRegistry::build(&self.rig)
    }

    /// Controls currently selected in the scene.
    pub fn selection(&self) -> Vec<String> {
        self.rig.selection.clone()
    }

    /// Writes the scene back to where it was loaded from.
    pub fn save(&self) -> Result<()> {
        self.save_as(&self.path)
    }

    /// Writes the scene to `path`.
    pub fn save_as(&self, path: &Path) -> Result<()> {
        let json = self.rig.to_json_pretty().context("Failed to serialize scene")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write scene: {}", path.display()))?;
        debug!(path = %path.display(), "Wrote scene");
        Ok(())
    }
}

// =============================================================================
// Collaborators
// =============================================================================

/// FK/IK matcher for scenes without a solver.
///
/// Leaves the limb pose as applied; the reconciler still restores the mode
/// toggle.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughMatcher;

impl LimbMatcher for PassthroughMatcher {
    fn match_limb(&mut self, _rig: &mut dyn RigHost, request: MatchRequest) -> RigResult<()> {
        info!(
            limb = %request.limb,
            from = %request.from,
            to = %request.to,
            "No solver attached; switching mode without matching"
        );
        Ok(())
    }
}

/// Answers store prompts from command-line flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlagDelegate {
    /// Replace existing records.
    pub force: bool,
    /// Clear the read-only bit on blocked files and retry.
    pub make_writable: bool,
}

impl FlagDelegate {
    pub fn new(force: bool, make_writable: bool) -> Self {
        Self {
            force,
            make_writable,
        }
    }
}

impl StoreDelegate for FlagDelegate {
    fn confirm_overwrite(&mut self, path: &Path) -> Decision {
        if self.force {
            Decision::Proceed
        } else {
            warn!(path = %path.display(), "Pose exists; pass --force to overwrite");
            Decision::Cancel
        }
    }

    fn recover_read_only(&mut self, path: &Path) -> Decision {
        if !self.make_writable {
            warn!(path = %path.display(), "Read-only; pass --make-writable to retry");
            return Decision::Cancel;
        }
        match make_writable(path) {
            Ok(()) => {
                info!(path = %path.display(), "Made writable");
                Decision::Proceed
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not make writable");
                Decision::Cancel
            }
        }
    }
}

fn make_writable(path: &Path) -> std::io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(permissions.mode() | 0o200);
    }
    #[cfg(not(unix))]
    {
        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(false);
    }
    fs::set_permissions(path, permissions)
}

/// Progress sink that logs each pass.
#[derive(Debug, Default)]
pub struct LogProgress {
    label: String,
    total: usize,
    done: usize,
}

impl Progress for LogProgress {
    fn begin(&mut self, label: &str, total: usize) {
        self.label = label.to_string();
        self.total = total;
        self.done = 0;
        debug!(total, "{}", label);
    }

    fn step(&mut self) {
        self.done += 1;
    }

    fn finish(&mut self) {
        debug!(done = self.done, total = self.total, "{} finished", self.label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posekit_core::Control;
    use tempfile::TempDir;

    #[test]
    fn test_scene_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("scene.json");
        let rig = MemoryRig::new()
            .with_control("fk_wrist_l_anim", Control::rotation().set("rx", 10.0))
            .with_selection(["fk_wrist_l_anim"]);
        fs::write(&path, rig.to_json_pretty().unwrap()).unwrap();

        let mut scene = Scene::load(&path).unwrap();
        assert_eq!(scene.selection(), vec!["fk_wrist_l_anim".to_string()]);
        assert!(scene.registry().contains("fk_wrist_l_anim"));

        scene.rig.set_attr("fk_wrist_l_anim", "rx", 5.0).unwrap();
        scene.save().unwrap();
        let reloaded = Scene::load(&path).unwrap();
        assert_eq!(reloaded.rig.value("fk_wrist_l_anim", "rx"), Some(5.0));
    }

    #[test]
    fn test_missing_scene() {
        let tmp = TempDir::new().unwrap();
        assert!(Scene::load(&tmp.path().join("nope.json")).is_err());
    }

    #[test]
    fn test_flag_delegate() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pose.json");
        fs::write(&path, "[]").unwrap();
        let mut permissions = fs::metadata(&path).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(&path, permissions).unwrap();

        let mut cautious = FlagDelegate::default();
        assert_eq!(cautious.confirm_overwrite(&path), Decision::Cancel);
        assert_eq!(cautious.recover_read_only(&path), Decision::Cancel);
        assert!(fs::metadata(&path).unwrap().permissions().readonly());

        let mut forceful = FlagDelegate::new(true, true);
        assert_eq!(forceful.confirm_overwrite(&path), Decision::Proceed);
        assert_eq!(forceful.recover_read_only(&path), Decision::Proceed);
        assert!(!fs::metadata(&path).unwrap().permissions().readonly());
    }
}

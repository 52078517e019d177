//! Test harness utilities: a temporary pose library and scripted collaborators.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use posekit_cli::config::{Library, PosekitConfig};
use posekit_core::{
    Decision, Limb, LimbMatcher, MatchRequest, MemoryRig, PoseStore, RigError, RigHost,
    RigResult, Snapshot, StoreDelegate,
};

/// Project every test library is created with.
pub const TEST_PROJECT: &str = "Hero";

/// A pose library rooted in a temporary directory.
pub struct TestLibrary {
    /// Root of the library; removed on drop.
    pub root: TempDir,
    pub store: PoseStore,
}

impl TestLibrary {
    /// Create a new empty library.
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create library dir");
        let store = PoseStore::new(root.path());
        Self { root, store }
    }

    /// Get the library root path.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// The library as the CLI resolves it.
    pub fn cli_library(&self) -> Library {
        PosekitConfig::default()
            .library_with(Some(self.path()), None, Some(TEST_PROJECT))
            .expect("Failed to resolve library")
    }

    /// Save a pose into the test project, overwriting silently.
    pub fn save(&self, name: &str, category: &str, snapshots: Vec<Snapshot>, partial: bool) -> PathBuf {
        let mut delegate = ScriptedDelegate::permissive();
        self.store
            .save(name, category, TEST_PROJECT, snapshots, partial, &mut delegate)
            .expect("Failed to save pose")
    }

    /// Write a rig scene next to the library and return its path.
    pub fn write_scene(&self, name: &str, rig: &MemoryRig) -> PathBuf {
        let path = self.path().join(format!("{}.scene.json", name));
        let json = rig.to_json_pretty().expect("Failed to serialize scene");
        fs::write(&path, json).expect("Failed to write scene");
        path
    }

    /// Read a scene back.
    pub fn read_scene(&self, path: &Path) -> MemoryRig {
        let json = fs::read_to_string(path).expect("Failed to read scene");
        MemoryRig::from_json(&json).expect("Failed to parse scene")
    }
}

impl Default for TestLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Store delegate with fixed answers that records every prompt.
#[derive(Debug, Clone)]
pub struct ScriptedDelegate {
    pub overwrite: Decision,
    /// Clear the read-only bit and proceed when asked to recover.
    pub recover: bool,
    pub overwrite_prompts: Vec<PathBuf>,
    pub recover_prompts: Vec<PathBuf>,
}

impl ScriptedDelegate {
    pub fn new(overwrite: Decision, recover: bool) -> Self {
        Self {
            overwrite,
            recover,
            overwrite_prompts: Vec::new(),
            recover_prompts: Vec::new(),
        }
    }

    /// Says yes to everything.
    pub fn permissive() -> Self {
        Self::new(Decision::Proceed, true)
    }

    /// Says no to everything.
    pub fn refusing() -> Self {
        Self::new(Decision::Cancel, false)
    }
}

impl StoreDelegate for ScriptedDelegate {
    fn confirm_overwrite(&mut self, path: &Path) -> Decision {
        self.overwrite_prompts.push(path.to_path_buf());
        self.overwrite
    }

    fn recover_read_only(&mut self, path: &Path) -> Decision {
        self.recover_prompts.push(path.to_path_buf());
        if !self.recover {
            return Decision::Cancel;
        }
        set_readonly(path, false);
        Decision::Proceed
    }
}

/// Limb matcher that records requests and optionally fails one limb.
#[derive(Debug, Clone, Default)]
pub struct RecordingMatcher {
    pub requests: Vec<MatchRequest>,
    pub fail: Option<Limb>,
}

impl RecordingMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every request for `limb`.
    pub fn failing(limb: Limb) -> Self {
        Self {
            requests: Vec::new(),
            fail: Some(limb),
        }
    }

    /// Limbs matched so far, in call order.
    pub fn limbs(&self) -> Vec<Limb> {
        self.requests.iter().map(|r| r.limb).collect()
    }
}

impl LimbMatcher for RecordingMatcher {
    fn match_limb(&mut self, _rig: &mut dyn RigHost, request: MatchRequest) -> RigResult<()> {
        self.requests.push(request);
        if self.fail == Some(request.limb) {
            return Err(RigError::Host(format!("cannot match {}", request.limb)));
        }
        Ok(())
    }
}

/// Set or clear the read-only bit of a file or directory.
pub fn set_readonly(path: &Path, readonly: bool) {
    let mut permissions = fs::metadata(path)
        .expect("Failed to stat path")
        .permissions();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = permissions.mode();
        permissions.set_mode(if readonly { mode & !0o222 } else { mode | 0o200 });
    }
    #[cfg(not(unix))]
    {
        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(readonly);
    }
    fs::set_permissions(path, permissions).expect("Failed to set permissions");
}

//! PoseKit End-to-End Test Infrastructure
//!
//! This crate drives the pose engine against the in-memory rig and a pose
//! library in a temporary directory:
//!
//! - **Store**: save, load, overwrite and delete flows on disk
//! - **Apply**: Exact, Selection and Partial application with mode
//!   reconciliation
//! - **Mirror**: live mirroring, paste-opposite and the name involution
//! - **Ghost**: build, snap and discard
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p posekit-tests
//! ```

pub mod fixtures;
pub mod harness;

// Re-export commonly used items
pub use fixtures::{arm_pose, standard_rig, standard_scene_json};
pub use harness::{RecordingMatcher, ScriptedDelegate, TestLibrary};

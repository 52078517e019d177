//! PoseKit Core Library
//!
//! This crate captures, stores and re-applies named poses of an articulated
//! character rig, mirrors poses across the rig's left/right control topology,
//! and restores per-limb FK/IK authoring modes after a pose is applied.
//!
//! # Overview
//!
//! The engine talks to the scene only through the [`RigHost`] trait. A
//! session starts by building a [`ControlRegistry`] from the rig; every
//! operation then takes that registry as an immutable input.
//!
//! - **Exact** application resets the rig, applies every snapshot, keys all
//!   controls and reconciles limb modes
//! - **Selection** application only touches selected controls
//! - **Partial** application overlays snapshots without reset or reconciliation
//!
//! # Example
//!
//! ```
//! use posekit_core::{
//!     ApplyMode, Control, ControlRegistry, LimbMatcher, MatchRequest, MemoryRig,
//!     PoseApplier, RigHost, RigResult, Snapshot,
//! };
//!
//! struct NoSolver;
//!
//! impl LimbMatcher for NoSolver {
//!     fn match_limb(&mut self, _rig: &mut dyn RigHost, _req: MatchRequest) -> RigResult<()> {
//!         Ok(())
//!     }
//! }
//!
//! let mut rig = MemoryRig::new()
//!     .with_control("fk_wrist_l_anim", Control::rotation().set("rx", 10.0));
//! let registry = ControlRegistry::build(&rig);
//!
//! let pose = vec![Snapshot::new("fk_wrist_l_anim")
//!     .with("rx", 0.0)
//!     .with("ry", 45.0)
//!     .with("rz", 0.0)];
//!
//! PoseApplier::new(&registry).apply(&mut rig, &pose, &ApplyMode::Exact, &mut NoSolver);
//!
//! assert_eq!(rig.value("fk_wrist_l_anim", "rx"), Some(0.0));
//! assert_eq!(rig.value("fk_wrist_l_anim", "ry"), Some(45.0));
//! ```
//!
//! # Modules
//!
//! - [`registry`]: The addressable control set of a rig instance
//! - [`store`]: Pose record persistence
//! - [`apply`]: Exact, Selection and Partial application
//! - [`reconcile`]: FK/IK mode restoration
//! - [`mirror`]: Name mirroring, rule table, live mirror and paste-opposite
//! - [`ghost`]: Ghost overlays for interactive snapping
//! - [`capture`]: Recording snapshots and validating spaces before save
//! - [`host`]: Collaborator traits
//! - [`memory_rig`]: In-memory rig used by tests and the CLI

pub mod apply;
pub mod capture;
pub mod error;
pub mod ghost;
pub mod host;
pub mod memory_rig;
pub mod mirror;
pub mod mode;
pub mod reconcile;
pub mod registry;
pub mod snapshot;
pub mod store;

// Re-export commonly used types at the crate root
pub use apply::{
    key_registered, write_snapshot, ApplyMode, ApplyOptions, ApplyReport, AttributeWrite,
    PoseApplier, SkipReason, WriteOutcome,
};
pub use capture::{
    capture_control, capture_full, capture_selection, validate_default_spaces, SpaceSwitchPolicy,
};
pub use error::{PoseError, PoseResult, RigError, RigResult};
pub use ghost::{Ghost, GhostMarker, GhostOverlay, GhostStyle, GhostVariant, SnapReport};
pub use host::{
    strip_namespace, Channel, DeclineAll, Decision, LimbMatcher, MatchRequest, NoProgress,
    NodeTransform, Progress, RigHost, StoreDelegate,
};
pub use memory_rig::{Attribute, Control, Keyframe, MemoryRig};
pub use mirror::{
    is_central, mirror_name, MirrorEngine, MirrorReport, MirrorRuleTable, MirrorStrategy,
    PasteReport,
};
pub use mode::{IkFkMode, Limb, RigModeState, Side, RIG_SETTINGS};
pub use reconcile::{LimbOutcome, ModeReconciler, ReconcileReport};
pub use registry::{ControlRegistry, ModuleDescriptor, ModuleKind, FIXED_CONTROLS};
pub use snapshot::{PoseDialect, PoseRecord, Snapshot, PARTIAL_SUFFIX};
pub use store::{load_snapshots, PoseLocation, PoseStore, StoreLayout};

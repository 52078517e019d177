//! Bilateral mirroring of poses.
//!
//! - [`naming`]: left/right control name mapping
//! - [`rules`]: per-group attribute mirror rules
//! - [`live`]: marker-based mirroring of the pose on the rig
//! - [`paste`]: pasting recorded data onto the opposite side

pub mod live;
pub mod naming;
pub mod paste;
pub mod rules;

pub use live::{build_markers, Marker, MirrorReport};
pub use naming::{is_central, mirror_name, side_of};
pub use paste::PasteReport;
pub use rules::{MirrorRule, MirrorRuleTable, MirrorStrategy, PairedAttributes, RuleMatch, RuleSet};

use tracing::info;

use crate::apply::PoseApplier;
use crate::host::{LimbMatcher, Progress, RigHost};
use crate::snapshot::Snapshot;

/// Mirrors poses using a fixed rule table.
#[derive(Debug, Clone, Default)]
pub struct MirrorEngine {
    table: MirrorRuleTable,
}

impl MirrorEngine {
    pub fn new(table: MirrorRuleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &MirrorRuleTable {
        &self.table
    }

    /// Opposite-side name of a control.
    pub fn mirror_name(&self, control: &str) -> String {
        mirror_name(control)
    }

    /// Applies `snapshots` exactly, then mirrors the result in place.
    pub fn mirror_pose(
        &self,
        rig: &mut dyn RigHost,
        applier: &PoseApplier<'_>,
        snapshots: &[Snapshot],
        matcher: &mut dyn LimbMatcher,
        progress: &mut dyn Progress,
    ) -> MirrorReport {
        let applied = applier.apply_exact(rig, snapshots, matcher);
        live::clear_fk_arm_orient(rig);
        let mut report = self.mirror_live(rig, applier, progress);
        report.apply = Some(applied);
        info!(
            mirrored = report.mirrored.len(),
            unsupported = report.unsupported.len(),
            missing = report.missing.len(),
            failures = report.failures.len(),
            "Mirrored pose"
        );
        report
    }

    /// Mirrors whatever pose is currently on the rig.
    pub fn mirror_live(
        &self,
        rig: &mut dyn RigHost,
        applier: &PoseApplier<'_>,
        progress: &mut dyn Progress,
    ) -> MirrorReport {
        live::mirror_live(rig, applier.registry(), &self.table, progress)
    }

    /// Pastes recorded data onto the opposite-side controls.
    pub fn paste_opposite(&self, rig: &mut dyn RigHost, snapshots: &[Snapshot]) -> PasteReport {
        let report = paste::paste_opposite(rig, snapshots, &self.table);
        info!(
            written = report.written(),
            missing = report.missing.len(),
            "Pasted pose onto opposite side"
        );
        report
    }
}

//! Applying stored snapshots to a live rig.
//!
//! Writes are name-matched against the live control's keyable attributes and
//! every attribute write yields an explicit [`WriteOutcome`]. A failed or
//! skipped write never stops the pass.

use tracing::{debug, info, warn};

use crate::host::{LimbMatcher, RigHost};
use crate::mode::RigModeState;
use crate::reconcile::{ModeReconciler, ReconcileReport};
use crate::registry::ControlRegistry;
use crate::snapshot::Snapshot;

// =============================================================================
// Write Outcomes
// =============================================================================

/// Why an attribute write was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The attribute is absent, locked or no longer keyable on the live control.
    PartialMatch,
    /// The control does not exist on the live rig.
    MissingControl,
    /// The control is not part of the current selection.
    NotSelected,
}

/// Result of one attribute write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    Written,
    Skipped(SkipReason),
    Failed(String),
}

/// One attribute write attempted during a pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeWrite {
    pub control: String,
    pub attribute: String,
    pub outcome: WriteOutcome,
}

/// Writes the attributes of one snapshot onto its control.
///
/// Attributes are processed in snapshot order and matched by name against the
/// control's live keyable list.
pub fn write_snapshot(rig: &mut dyn RigHost, snapshot: &Snapshot) -> Vec<AttributeWrite> {
    write_values(rig, &snapshot.control, snapshot.iter())
}

/// Writes `(attribute, value)` pairs onto a control, name-matched.
pub fn write_values<'a>(
    rig: &mut dyn RigHost,
    control: &str,
    values: impl Iterator<Item = (&'a str, f64)>,
) -> Vec<AttributeWrite> {
    let record = |attribute: &str, outcome| AttributeWrite {
        control: control.to_string(),
        attribute: attribute.to_string(),
        outcome,
    };

    let live = match rig.keyable_attributes(control) {
        Ok(live) => live,
        Err(_) => {
            return values
                .map(|(attribute, _)| {
                    record(attribute, WriteOutcome::Skipped(SkipReason::MissingControl))
                })
                .collect();
        }
    };

    let mut writes = Vec::new();
    for (attribute, value) in values {
        if !live.iter().any(|a| a == attribute) {
            debug!(control, attribute, "Attribute not keyable on live control");
            writes.push(record(
                attribute,
                WriteOutcome::Skipped(SkipReason::PartialMatch),
            ));
            continue;
        }
        let outcome = match rig.set_attr(control, attribute, value) {
            Ok(()) => WriteOutcome::Written,
            Err(e) => {
                warn!(control, attribute, error = %e, "Attribute write failed");
                WriteOutcome::Failed(e.to_string())
            }
        };
        writes.push(record(attribute, outcome));
    }
    writes
}

// =============================================================================
// Options
// =============================================================================

/// Space switch attributes left alone by the Exact reset.
pub const PRESERVED_SPACE_ATTRIBUTES: &[&str] = &[
    "sx",
    "sy",
    "sz",
    "v",
    "scaleX",
    "scaleY",
    "scaleZ",
    "visibility",
];

/// Tunables for [`PoseApplier`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOptions {
    /// Reset registered controls before an Exact apply.
    pub reset: bool,
    /// Key every registered control after an Exact apply.
    pub key_all: bool,
    /// Restore per-limb FK/IK modes after an Exact apply.
    pub reconcile: bool,
    /// Space switch attributes that survive the Exact reset.
    pub preserved_space_attributes: Vec<String>,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            reset: true,
            key_all: true,
            reconcile: true,
            preserved_space_attributes: PRESERVED_SPACE_ATTRIBUTES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ApplyOptions {
    /// Enables or disables the Exact reset.
    pub fn reset(mut self, enabled: bool) -> Self {
        self.reset = enabled;
        self
    }

    /// Enables or disables keying after Exact.
    pub fn key_all(mut self, enabled: bool) -> Self {
        self.key_all = enabled;
        self
    }

    /// Enables or disables mode reconciliation.
    pub fn reconcile(mut self, enabled: bool) -> Self {
        self.reconcile = enabled;
        self
    }
}

// =============================================================================
// Applier
// =============================================================================

/// How a pose is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyMode {
    /// Reset, apply everything, key, reconcile modes.
    Exact,
    /// Apply only to the given (selected) controls.
    Selection(Vec<String>),
    /// Apply as an overlay: no reset, no keying, no reconciliation.
    Partial,
}

impl ApplyMode {
    pub fn name(&self) -> &'static str {
        match self {
            ApplyMode::Exact => "exact",
            ApplyMode::Selection(_) => "selection",
            ApplyMode::Partial => "partial",
        }
    }
}

/// Summary of one apply pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    /// Every attribute write attempted, in order.
    pub writes: Vec<AttributeWrite>,
    /// Snapshot controls that do not exist on the rig.
    pub missing_controls: Vec<String>,
    /// Number of controls reset before applying.
    pub reset_controls: usize,
    /// Number of controls keyed after applying.
    pub keyed_controls: usize,
    /// Mode reconciliation result, when it ran.
    pub reconcile: Option<ReconcileReport>,
}

impl ApplyReport {
    fn count(&self, pred: impl Fn(&WriteOutcome) -> bool) -> usize {
        self.writes.iter().filter(|w| pred(&w.outcome)).count()
    }

    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, WriteOutcome::Written))
    }

    pub fn partial_matches(&self) -> usize {
        self.count(|o| matches!(o, WriteOutcome::Skipped(SkipReason::PartialMatch)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, WriteOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, WriteOutcome::Failed(_)))
    }
}

/// Applies snapshots to a live rig against a fixed control registry.
#[derive(Debug, Clone)]
pub struct PoseApplier<'a> {
    registry: &'a ControlRegistry,
    options: ApplyOptions,
}

impl<'a> PoseApplier<'a> {
    pub fn new(registry: &'a ControlRegistry) -> Self {
        Self {
            registry,
            options: ApplyOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ApplyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &ControlRegistry {
        self.registry
    }

    /// Applies snapshots in the given mode.
    pub fn apply(
        &self,
        rig: &mut dyn RigHost,
        snapshots: &[Snapshot],
        mode: &ApplyMode,
        matcher: &mut dyn LimbMatcher,
    ) -> ApplyReport {
        let report = match mode {
            ApplyMode::Exact => self.apply_exact(rig, snapshots, matcher),
            ApplyMode::Selection(selection) => self.apply_selection(rig, snapshots, selection),
            ApplyMode::Partial => self.apply_partial(rig, snapshots),
        };
        info!(
            mode = mode.name(),
            written = report.written(),
            partial = report.partial_matches(),
            failed = report.failed(),
            missing = report.missing_controls.len(),
            "Applied pose"
        );
        report
    }

    /// Exact application: reset, apply, key, refresh and reconcile.
    pub fn apply_exact(
        &self,
        rig: &mut dyn RigHost,
        snapshots: &[Snapshot],
        matcher: &mut dyn LimbMatcher,
    ) -> ApplyReport {
        let recorded = match RigModeState::capture(rig) {
            Ok(state) => Some(state),
            Err(e) => {
                debug!(error = %e, "Rig modes unavailable, reconciliation disabled");
                None
            }
        };

        let mut report = ApplyReport::default();
        if self.options.reset {
            report.reset_controls = self.reset(rig);
        }

        self.write_all(rig, snapshots, None, &mut report);

        if self.options.key_all {
            report.keyed_controls = key_registered(rig, self.registry);
        }

        match recorded {
            Some(recorded) if self.options.reconcile => {
                report.reconcile = Some(ModeReconciler::reconcile(rig, &recorded, matcher));
            }
            _ => rig.refresh_timeline(),
        }
        report
    }

    /// Selection application: only selected controls, nothing else touched.
    pub fn apply_selection(
        &self,
        rig: &mut dyn RigHost,
        snapshots: &[Snapshot],
        selection: &[String],
    ) -> ApplyReport {
        let selected: Vec<&str> = selection
            .iter()
            .map(|s| crate::strip_namespace(s))
            .collect();
        let mut report = ApplyReport::default();
        self.write_all(rig, snapshots, Some(&selected), &mut report);
        report
    }

    /// Partial application: overlay without reset or reconciliation.
    ///
    /// Mode reconciliation is deliberately not run here even if the
    /// snapshots touch the mode toggles.
    pub fn apply_partial(&self, rig: &mut dyn RigHost, snapshots: &[Snapshot]) -> ApplyReport {
        let mut report = ApplyReport::default();
        self.write_all(rig, snapshots, None, &mut report);
        report
    }

    fn write_all(
        &self,
        rig: &mut dyn RigHost,
        snapshots: &[Snapshot],
        selection: Option<&[&str]>,
        report: &mut ApplyReport,
    ) {
        for snapshot in snapshots {
            if let Some(selected) = selection {
                if !selected.contains(&snapshot.control.as_str()) {
                    continue;
                }
            }
            if !rig.control_exists(&snapshot.control) {
                debug!(control = %snapshot.control, "Skipping control missing on rig");
                report.missing_controls.push(snapshot.control.clone());
                continue;
            }
            report.writes.extend(write_snapshot(rig, snapshot));
        }
    }

    /// Resets registered controls and zeroes space switch weights.
    fn reset(&self, rig: &mut dyn RigHost) -> usize {
        let mut count = 0;
        for control in self.registry.controls() {
            if !rig.control_exists(control) {
                continue;
            }
            match rig.reset_control(control) {
                Ok(()) => count += 1,
                Err(e) => warn!(control, error = %e, "Reset failed"),
            }
        }

        for node in self.registry.space_switches() {
            let Ok(attributes) = rig.keyable_attributes(node) else {
                continue;
            };
            for attribute in attributes {
                if self
                    .options
                    .preserved_space_attributes
                    .iter()
                    .any(|p| *p == attribute)
                {
                    continue;
                }
                if let Err(e) = rig.set_attr(node, &attribute, 0.0) {
                    warn!(node = %node, attribute = %attribute, error = %e, "Space reset failed");
                }
            }
        }
        count
    }
}

/// Keys every registered control present on the rig, returning the count.
pub fn key_registered(rig: &mut dyn RigHost, registry: &ControlRegistry) -> usize {
    let mut count = 0;
    for control in registry.controls() {
        if !rig.control_exists(control) {
            continue;
        }
        match rig.set_key(control, None) {
            Ok(()) => count += 1,
            Err(e) => warn!(control, error = %e, "Keying failed"),
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RigResult;
    use crate::host::MatchRequest;
    use crate::memory_rig::{Control, MemoryRig};

    struct NoMatch;

    impl LimbMatcher for NoMatch {
        fn match_limb(&mut self, _rig: &mut dyn RigHost, _request: MatchRequest) -> RigResult<()> {
            Ok(())
        }
    }

    fn rig() -> MemoryRig {
        MemoryRig::new()
            .with_control("fk_wrist_l_anim", Control::rotation().set("rx", 10.0))
            .with_control(
                "hip_anim",
                Control::transform().set("tx", 4.0).locked_attr("lockme", 1.0),
            )
            .with_control(
                "ik_wrist_l_anim_space_switcher",
                Control::new()
                    .attr("space_world", 1.0)
                    .attr("space_head", 1.0)
                    .attr_with_default("v", 1.0, 1.0),
            )
    }

    fn registry() -> ControlRegistry {
        ControlRegistry::from_controls([
            "fk_wrist_l_anim",
            "hip_anim",
            "ik_wrist_l_anim_space_switcher",
        ])
    }

    #[test]
    fn test_exact_resets_and_writes() {
        let mut rig = rig();
        let registry = registry();
        let snapshots = vec![Snapshot::new("fk_wrist_l_anim")
            .with("rx", 0.0)
            .with("ry", 45.0)
            .with("rz", 0.0)];

        let report = PoseApplier::new(&registry).apply(
            &mut rig,
            &snapshots,
            &ApplyMode::Exact,
            &mut NoMatch,
        );

        assert_eq!(rig.value("fk_wrist_l_anim", "rx"), Some(0.0));
        assert_eq!(rig.value("fk_wrist_l_anim", "ry"), Some(45.0));
        assert_eq!(rig.value("fk_wrist_l_anim", "rz"), Some(0.0));
        // Absent from the pose, back to neutral.
        assert_eq!(rig.value("hip_anim", "tx"), Some(0.0));
        assert_eq!(report.written(), 3);
        assert_eq!(report.reset_controls, 3);
        assert_eq!(report.keyed_controls, 3);
        assert!(report.reconcile.is_none());
    }

    #[test]
    fn test_exact_zeroes_space_weights() {
        let mut rig = rig();
        let registry = registry();
        PoseApplier::new(&registry).apply_exact(&mut rig, &[], &mut NoMatch);
        let node = "ik_wrist_l_anim_space_switcher";
        assert_eq!(rig.value(node, "space_world"), Some(0.0));
        assert_eq!(rig.value(node, "space_head"), Some(0.0));
        assert_eq!(rig.value(node, "v"), Some(1.0));
    }

    #[test]
    fn test_partial_match_and_missing() {
        let mut rig = rig();
        let registry = registry();
        let snapshots = vec![
            Snapshot::new("hip_anim")
                .with("lockme", 9.0)
                .with("gone", 1.0)
                .with("ty", 2.0),
            Snapshot::new("old_control").with("tx", 1.0),
        ];

        let report = PoseApplier::new(&registry).apply_partial(&mut rig, &snapshots);

        assert_eq!(report.partial_matches(), 2);
        assert_eq!(report.written(), 1);
        assert_eq!(report.missing_controls, vec!["old_control".to_string()]);
        assert_eq!(rig.value("hip_anim", "ty"), Some(2.0));
        assert_eq!(rig.value("hip_anim", "tx"), Some(4.0));
        assert_eq!(rig.value("hip_anim", "lockme"), Some(1.0));
        assert!(rig.keys.is_empty());
    }

    #[test]
    fn test_selection_filters_controls() {
        let mut rig = rig();
        let registry = registry();
        let snapshots = vec![
            Snapshot::new("hip_anim").with("tx", 7.0),
            Snapshot::new("fk_wrist_l_anim").with("rx", 30.0),
        ];
        let selection = vec!["hero:fk_wrist_l_anim".to_string()];

        let report = PoseApplier::new(&registry).apply(
            &mut rig,
            &snapshots,
            &ApplyMode::Selection(selection),
            &mut NoMatch,
        );

        assert_eq!(report.written(), 1);
        assert_eq!(rig.value("fk_wrist_l_anim", "rx"), Some(30.0));
        assert_eq!(rig.value("hip_anim", "tx"), Some(4.0));
    }

    #[test]
    fn test_exact_without_reset() {
        let mut rig = rig();
        let registry = registry();
        let applier =
            PoseApplier::new(&registry).with_options(ApplyOptions::default().reset(false));
        applier.apply_exact(&mut rig, &[], &mut NoMatch);
        assert_eq!(rig.value("hip_anim", "tx"), Some(4.0));
    }
}

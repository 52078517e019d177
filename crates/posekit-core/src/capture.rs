//! Recording live control values into snapshots, and the space checks that
//! gate saving.

use tracing::{debug, warn};

use crate::error::{PoseError, PoseResult};
use crate::host::{strip_namespace, RigHost};
use crate::registry::ControlRegistry;
use crate::snapshot::Snapshot;

/// Records one control's keyable, unlocked attributes in host order.
///
/// Returns `None` if the control is missing or exposes no keyable attributes.
pub fn capture_control(rig: &dyn RigHost, control: &str) -> Option<Snapshot> {
    let attributes = rig.keyable_attributes(control).ok()?;
    if attributes.is_empty() {
        return None;
    }
    let mut snapshot = Snapshot::new(control);
    for attribute in attributes {
        match rig.get_attr(control, &attribute) {
            Ok(value) => snapshot.push(attribute, value),
            Err(e) => warn!(control, attribute = %attribute, error = %e, "Skipping unreadable attribute"),
        }
    }
    Some(snapshot)
}

/// Records every registered control present on the rig.
pub fn capture_full(rig: &dyn RigHost, registry: &ControlRegistry) -> Vec<Snapshot> {
    let snapshots: Vec<_> = registry
        .controls()
        .filter(|c| rig.control_exists(c))
        .filter_map(|c| capture_control(rig, c))
        .collect();
    debug!(controls = snapshots.len(), "Captured full pose");
    snapshots
}

/// Records the selected controls, stripping namespaces.
pub fn capture_selection(rig: &dyn RigHost, selection: &[String]) -> Vec<Snapshot> {
    let mut seen = Vec::new();
    let mut snapshots = Vec::new();
    for selected in selection {
        let control = strip_namespace(selected);
        if seen.contains(&control) {
            continue;
        }
        seen.push(control);
        if let Some(snapshot) = capture_control(rig, control) {
            snapshots.push(snapshot);
        }
    }
    debug!(controls = snapshots.len(), "Captured selection pose");
    snapshots
}

// =============================================================================
// Space Validation
// =============================================================================

/// Which space weights may be non-zero when a pose is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceSwitchPolicy {
    /// Prefix of space weight attributes.
    pub prefix: String,
    /// Weights allowed to be active.
    pub safe: Vec<String>,
}

impl Default for SpaceSwitchPolicy {
    fn default() -> Self {
        Self {
            prefix: "space_".to_string(),
            safe: [
                "space_world",
                "space_chest_ik_world_aligned",
                "space_body_anim",
                "space_head_fk_anim",
                "space_chest_ik_anim",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl SpaceSwitchPolicy {
    /// Adds a weight to the safe set.
    pub fn allow(mut self, attribute: impl Into<String>) -> Self {
        self.safe.push(attribute.into());
        self
    }

    fn is_safe(&self, attribute: &str) -> bool {
        self.safe.iter().any(|s| s == attribute)
    }
}

/// Ensures every space switch node is in a default space.
///
/// Fails with [`PoseError::NonDefaultSpace`] listing `node.attribute` for
/// every active weight outside the safe set.
pub fn validate_default_spaces(
    rig: &dyn RigHost,
    registry: &ControlRegistry,
    policy: &SpaceSwitchPolicy,
) -> PoseResult<()> {
    let mut offenders = Vec::new();
    for node in registry.space_switches() {
        let Ok(attributes) = rig.keyable_attributes(node) else {
            continue;
        };
        for attribute in attributes
            .iter()
            .filter(|a| a.starts_with(&policy.prefix))
        {
            let value = rig.get_attr(node, attribute).unwrap_or(0.0);
            if value != 0.0 && !policy.is_safe(attribute) {
                offenders.push(format!("{}.{}", node, attribute));
            }
        }
    }

    if offenders.is_empty() {
        Ok(())
    } else {
        Err(PoseError::NonDefaultSpace {
            attributes: offenders,
        })
    }
}

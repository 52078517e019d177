//! Pasting recorded data onto the opposite side.

use tracing::debug;

use super::naming::mirror_name;
use super::rules::MirrorRuleTable;
use crate::apply::{write_values, AttributeWrite, WriteOutcome};
use crate::host::{Channel, RigHost};
use crate::snapshot::Snapshot;

/// Summary of a paste-opposite pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasteReport {
    pub writes: Vec<AttributeWrite>,
    /// Central controls in the data; they are never touched.
    pub central: Vec<String>,
    /// Opposite controls that do not exist on the rig.
    pub missing: Vec<String>,
}

impl PasteReport {
    pub fn written(&self) -> usize {
        self.writes
            .iter()
            .filter(|w| w.outcome == WriteOutcome::Written)
            .count()
    }
}

/// Writes each sided snapshot onto its opposite control, negating the
/// channels the target's rule lists for pasting.
pub fn paste_opposite(
    rig: &mut dyn RigHost,
    snapshots: &[Snapshot],
    table: &MirrorRuleTable,
) -> PasteReport {
    let mut report = PasteReport::default();
    for snapshot in snapshots {
        let target = mirror_name(&snapshot.control);
        if target == snapshot.control {
            report.central.push(target);
            continue;
        }
        if !rig.control_exists(&target) {
            debug!(control = %target, "Opposite control missing");
            report.missing.push(target);
            continue;
        }

        let negate = table.lookup(&target, false).paste_negate();
        let values = snapshot.iter().map(|(attribute, value)| {
            let flip = Channel::from_attribute(attribute)
                .map(|c| negate.contains(&c))
                .unwrap_or(false);
            (attribute, if flip { -value } else { value })
        });
        report.writes.extend(write_values(rig, &target, values));
    }
    report
}

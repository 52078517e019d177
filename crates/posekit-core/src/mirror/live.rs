//! Mirroring the pose currently on the rig.
//!
//! Every control is captured into a marker keyed by its mirrored name, with
//! the world position reflected across the X=0 plane. Markers are built
//! before anything is written, so each side reads the other side's
//! unmodified state.

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::naming::mirror_name;
use super::rules::{MirrorRuleTable, MirrorStrategy, RuleMatch};
use crate::apply::ApplyReport;
use crate::error::RigResult;
use crate::host::{Channel, Progress, RigHost};
use crate::mode::RIG_SETTINGS;
use crate::registry::ControlRegistry;

/// FK arm orientation toggles zeroed before a mirrored apply.
pub const FK_ARM_ORIENT_ATTRIBUTES: [&str; 2] = ["lFkArmOrient", "rFkArmOrient"];

// =============================================================================
// Markers
// =============================================================================

/// Reflected reference state of one control, addressed to its mirror target.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// Control the state was captured from.
    pub source: String,
    /// Control the state will be applied to.
    pub target: String,
    /// Source world position reflected through X.
    pub position: [f64; 3],
    /// Raw source rotation channels.
    pub rotation: [Option<f64>; 3],
    /// Raw source translation channels, if the control has all three.
    pub translation: Option<[f64; 3]>,
}

impl Marker {
    /// Captures a marker from a live control.
    pub fn capture(rig: &dyn RigHost, source: &str, target: String) -> RigResult<Self> {
        let [x, y, z] = rig.world_position(source)?;
        let read = |c: Channel| rig.get_attr(source, c.attribute()).ok();
        let translation = match (read(Channel::Tx), read(Channel::Ty), read(Channel::Tz)) {
            (Some(tx), Some(ty), Some(tz)) => Some([tx, ty, tz]),
            _ => None,
        };
        Ok(Self {
            source: source.to_string(),
            target,
            position: [-x, y, z],
            rotation: [read(Channel::Rx), read(Channel::Ry), read(Channel::Rz)],
            translation,
        })
    }

    /// Recorded value of a channel.
    pub fn channel(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Tx => self.translation.map(|t| t[0]),
            Channel::Ty => self.translation.map(|t| t[1]),
            Channel::Tz => self.translation.map(|t| t[2]),
            Channel::Rx => self.rotation[0],
            Channel::Ry => self.rotation[1],
            Channel::Rz => self.rotation[2],
        }
    }
}

/// Builds one marker per mirror target. The first control mapping onto a
/// target wins.
pub fn build_markers(rig: &dyn RigHost, registry: &ControlRegistry) -> IndexMap<String, Marker> {
    let mut markers = IndexMap::new();
    for control in registry.controls() {
        if !rig.control_exists(control) {
            continue;
        }
        let target = mirror_name(control);
        if markers.contains_key(&target) {
            continue;
        }
        match Marker::capture(rig, control, target.clone()) {
            Ok(marker) => {
                markers.insert(target, marker);
            }
            Err(e) => debug!(control, error = %e, "No marker for control"),
        }
    }
    markers
}

// =============================================================================
// Mirror Pass
// =============================================================================

/// Summary of a mirror pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MirrorReport {
    /// Result of the Exact apply preceding the mirror, if any.
    pub apply: Option<ApplyReport>,
    /// Targets that received mirrored values.
    pub mirrored: Vec<String>,
    /// Targets left as applied by a keep rule.
    pub kept: Vec<String>,
    /// Targets with no rule; they received an unmirrored rotation copy.
    pub unsupported: Vec<String>,
    /// Targets that do not exist on the rig.
    pub missing: Vec<String>,
    /// Individual failures as `(control, message)`.
    pub failures: Vec<(String, String)>,
    /// Paired attributes swapped.
    pub swapped: usize,
    /// Custom module controls re-applied by the settle pass.
    pub settled: usize,
}

/// Zeroes the FK arm orientation toggles, if the rig has them.
pub fn clear_fk_arm_orient(rig: &mut dyn RigHost) {
    for attribute in FK_ARM_ORIENT_ATTRIBUTES {
        if let Err(e) = rig.set_attr(RIG_SETTINGS, attribute, 0.0) {
            debug!(attribute, error = %e, "FK arm orient toggle not set");
        }
    }
}

/// Mirrors the pose currently on the rig in place.
pub fn mirror_live(
    rig: &mut dyn RigHost,
    registry: &ControlRegistry,
    table: &MirrorRuleTable,
    progress: &mut dyn Progress,
) -> MirrorReport {
    let markers = build_markers(rig, registry);
    let mut report = MirrorReport::default();

    let settle: Vec<&Marker> = markers
        .values()
        .filter(|m| registry.is_custom_module(&m.target) && !m.target.contains("_cv_"))
        .collect();

    progress.begin("Mirroring pose", markers.len() + settle.len());

    for marker in markers.values() {
        progress.step();
        let target = marker.target.as_str();
        if !rig.control_exists(target) {
            report.missing.push(target.to_string());
            continue;
        }

        let lookup = table.lookup(target, registry.is_custom_module(target));
        if lookup == RuleMatch::Unsupported {
            warn!(control = target, "No mirror rule, copying rotation unmirrored");
            report.unsupported.push(target.to_string());
        }

        let strategy = lookup.strategy();
        if strategy == MirrorStrategy::Keep {
            report.kept.push(target.to_string());
            continue;
        }

        let failures = apply_strategy(rig, marker, &strategy);
        if lookup != RuleMatch::Unsupported {
            report.mirrored.push(target.to_string());
        }
        report
            .failures
            .extend(failures.into_iter().map(|f| (target.to_string(), f)));
    }

    report.swapped = swap_paired(rig, table, &mut report.failures);

    for marker in settle {
        progress.step();
        if !rig.control_exists(&marker.target) {
            continue;
        }
        let strategy = table.lookup(&marker.target, true).strategy();
        let failures = apply_strategy(rig, marker, &strategy);
        report
            .failures
            .extend(failures.into_iter().map(|f| (marker.target.clone(), f)));
        report.settled += 1;
    }

    progress.finish();
    debug!(
        mirrored = report.mirrored.len(),
        unsupported = report.unsupported.len(),
        failures = report.failures.len(),
        "Mirrored live pose"
    );
    report
}

/// Applies one strategy to a marker's target, returning failure messages.
pub fn apply_strategy(
    rig: &mut dyn RigHost,
    marker: &Marker,
    strategy: &MirrorStrategy,
) -> Vec<String> {
    let target = marker.target.as_str();
    let mut failures = Vec::new();

    match strategy {
        MirrorStrategy::Keep => return failures,
        MirrorStrategy::Resolve {
            copy_rotation,
            negate,
        } => {
            let positional = Channel::TRANSLATE
                .iter()
                .all(|c| rig.is_keyable(target, c.attribute()));
            if positional {
                if let Err(e) = rig.set_world_position(target, marker.position) {
                    failures.push(e.to_string());
                }
            }
            if *copy_rotation {
                copy_channels(rig, marker, &Channel::ROTATE, negate, &mut failures);
            }
        }
        MirrorStrategy::Direct { channels, negate } => {
            copy_channels(rig, marker, channels, negate, &mut failures);
        }
    }

    if let Err(e) = rig.set_key(target, None) {
        failures.push(e.to_string());
    }
    failures
}

fn copy_channels(
    rig: &mut dyn RigHost,
    marker: &Marker,
    channels: &[Channel],
    negate: &[Channel],
    failures: &mut Vec<String>,
) {
    for channel in channels {
        let Some(value) = marker.channel(*channel) else {
            continue;
        };
        if !rig.is_keyable(&marker.target, channel.attribute()) {
            continue;
        }
        let value = if negate.contains(channel) { -value } else { value };
        if let Err(e) = rig.set_attr(&marker.target, channel.attribute(), value) {
            failures.push(e.to_string());
        }
    }
}

/// Swaps paired scalar attributes between sides. Returns the swap count.
fn swap_paired(
    rig: &mut dyn RigHost,
    table: &MirrorRuleTable,
    failures: &mut Vec<(String, String)>,
) -> usize {
    let mut swapped = 0;
    for pair in table.paired() {
        if !rig.control_exists(&pair.left) || !rig.control_exists(&pair.right) {
            continue;
        }
        for attribute in &pair.attributes {
            let (Ok(left), Ok(right)) = (
                rig.get_attr(&pair.left, attribute),
                rig.get_attr(&pair.right, attribute),
            ) else {
                continue;
            };
            for (control, value) in [(&pair.left, right), (&pair.right, left)] {
                if let Err(e) = rig.set_attr(control, attribute, value) {
                    failures.push((control.clone(), e.to_string()));
                }
            }
            swapped += 1;
        }
    }
    swapped
}

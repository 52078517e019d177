//! The addressable control set of one rig instance.
//!
//! Built once per rig session from the fixed skeleton controls, the custom
//! module descriptors attached to the rig, and the active space switch
//! nodes. The result is immutable and passed into every operation.

use std::collections::HashSet;

use indexmap::IndexSet;
use regex::Regex;
use tracing::{debug, warn};

use crate::host::RigHost;

/// Node name suffix identifying a space switch driver.
pub const SPACE_SWITCH_FOLLOW_SUFFIX: &str = "_space_switcher_follow";

/// Skeleton-level controls present on every rig.
pub const FIXED_CONTROLS: &[&str] = &[
    "head_fk_anim",
    "neck_01_fk_anim",
    "neck_02_fk_anim",
    "neck_03_fk_anim",
    "spine_01_anim",
    "spine_02_anim",
    "spine_03_anim",
    "spine_04_anim",
    "spine_05_anim",
    "mid_ik_anim",
    "chest_ik_anim",
    "body_anim",
    "hip_anim",
    "clavicle_l_anim",
    "clavicle_r_anim",
    "fk_arm_l_anim",
    "fk_arm_r_anim",
    "fk_elbow_l_anim",
    "fk_elbow_r_anim",
    "fk_wrist_l_anim",
    "fk_wrist_r_anim",
    "ik_elbow_l_anim",
    "ik_elbow_r_anim",
    "ik_wrist_l_anim",
    "ik_wrist_r_anim",
    "fk_thigh_l_anim",
    "fk_thigh_r_anim",
    "fk_calf_l_anim",
    "fk_calf_r_anim",
    "fk_foot_l_anim",
    "fk_foot_r_anim",
    "fk_ball_l_anim",
    "fk_ball_r_anim",
    "ik_foot_anim_l",
    "ik_foot_anim_r",
    "heel_ctrl_l",
    "heel_ctrl_r",
    "toe_wiggle_ctrl_l",
    "toe_wiggle_ctrl_r",
    "toe_tip_ctrl_l",
    "toe_tip_ctrl_r",
    "master_anim",
    "offset_anim",
    "root_anim",
    "upperarm_l_twist_anim",
    "upperarm_r_twist_anim",
    "thigh_l_twist_anim",
    "thigh_r_twist_anim",
    "pinky_metacarpal_ctrl_l",
    "pinky_metacarpal_ctrl_r",
    "pinky_finger_fk_ctrl_1_l",
    "pinky_finger_fk_ctrl_1_r",
    "pinky_finger_fk_ctrl_2_l",
    "pinky_finger_fk_ctrl_2_r",
    "pinky_finger_fk_ctrl_3_l",
    "pinky_finger_fk_ctrl_3_r",
    "ring_metacarpal_ctrl_l",
    "ring_metacarpal_ctrl_r",
    "ring_finger_fk_ctrl_1_l",
    "ring_finger_fk_ctrl_1_r",
    "ring_finger_fk_ctrl_2_l",
    "ring_finger_fk_ctrl_2_r",
    "ring_finger_fk_ctrl_3_l",
    "ring_finger_fk_ctrl_3_r",
    "middle_metacarpal_ctrl_l",
    "middle_metacarpal_ctrl_r",
    "middle_finger_fk_ctrl_1_l",
    "middle_finger_fk_ctrl_1_r",
    "middle_finger_fk_ctrl_2_l",
    "middle_finger_fk_ctrl_2_r",
    "middle_finger_fk_ctrl_3_l",
    "middle_finger_fk_ctrl_3_r",
    "index_metacarpal_ctrl_l",
    "index_metacarpal_ctrl_r",
    "index_finger_fk_ctrl_1_l",
    "index_finger_fk_ctrl_1_r",
    "index_finger_fk_ctrl_2_l",
    "index_finger_fk_ctrl_2_r",
    "index_finger_fk_ctrl_3_l",
    "index_finger_fk_ctrl_3_r",
    "thumb_finger_fk_ctrl_1_l",
    "thumb_finger_fk_ctrl_1_r",
    "thumb_finger_fk_ctrl_2_l",
    "thumb_finger_fk_ctrl_2_r",
    "thumb_finger_fk_ctrl_3_l",
    "thumb_finger_fk_ctrl_3_r",
    "index_l_ik_anim",
    "index_r_ik_anim",
    "middle_l_ik_anim",
    "middle_r_ik_anim",
    "ring_l_ik_anim",
    "ring_r_ik_anim",
    "pinky_l_ik_anim",
    "pinky_r_ik_anim",
    "thumb_l_ik_anim",
    "thumb_r_ik_anim",
    "index_l_poleVector",
    "index_r_poleVector",
    "middle_l_poleVector",
    "middle_r_poleVector",
    "ring_l_poleVector",
    "ring_r_poleVector",
    "pinky_l_poleVector",
    "pinky_r_poleVector",
    "thumb_l_poleVector",
    "thumb_r_poleVector",
    "l_global_ik_anim",
    "r_global_ik_anim",
    "Rig_Settings",
];

// =============================================================================
// Module Descriptors
// =============================================================================

/// Kind of a custom rig module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// A single extra joint with one control.
    Leaf,
    /// A single jiggle joint with one control.
    Jiggle,
    /// A segmented chain with FK, control-vertex and IK controls.
    Chain,
    /// A dynamic chain, expanded like [`ModuleKind::Chain`].
    Dynamic,
}

impl ModuleKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "leaf" => Some(ModuleKind::Leaf),
            "jiggle" => Some(ModuleKind::Jiggle),
            "chain" => Some(ModuleKind::Chain),
            "dynamic" => Some(ModuleKind::Dynamic),
            _ => None,
        }
    }
}

/// A parsed custom module descriptor.
///
/// Descriptors are `parent/kind/label` strings. Chain and dynamic labels
/// carry their segment count as `name (N)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub kind: ModuleKind,
    pub label: String,
    pub segments: usize,
}

impl ModuleDescriptor {
    /// Parses a raw descriptor, returning `None` if it is malformed.
    pub fn parse(raw: &str) -> Option<Self> {
        let (_, rest) = raw.split_once('/')?;
        let (kind, label) = rest.split_once('/')?;
        let kind = ModuleKind::parse(kind)?;
        let label = label.rsplit('/').next().unwrap_or(label);

        let (name, count) = match label.split_once(" (") {
            Some((name, tail)) => (name, tail.strip_suffix(')')),
            None => (label, None),
        };
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let segments = match kind {
            ModuleKind::Leaf | ModuleKind::Jiggle => 1,
            ModuleKind::Chain | ModuleKind::Dynamic => count?.trim().parse().ok()?,
        };

        // Jiggle labels are used verbatim.
        let label = match kind {
            ModuleKind::Jiggle => label.to_string(),
            _ => name.to_string(),
        };

        Some(Self {
            kind,
            label,
            segments,
        })
    }

    /// Controls this module declares, before IK discovery.
    pub fn declared_controls(&self) -> Vec<String> {
        match self.kind {
            ModuleKind::Leaf | ModuleKind::Jiggle => vec![format!("{}_anim", self.label)],
            ModuleKind::Chain | ModuleKind::Dynamic => {
                let mut controls = vec![format!("{}_dyn_anim", self.label)];
                for i in 0..self.segments {
                    // Segment numbers are always written with one leading zero.
                    controls.push(format!("fk_{}_0{}_anim", self.label, i + 1));
                    controls.push(format!("{}_cv_{}_anim", self.label, i));
                }
                controls
            }
        }
    }

    /// Pattern matching this chain's IK controls.
    fn ik_pattern(&self) -> Option<Regex> {
        match self.kind {
            ModuleKind::Chain | ModuleKind::Dynamic => {
                Regex::new(&format!("^{}_ik_.*_anim$", regex::escape(&self.label))).ok()
            }
            _ => None,
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Immutable, deduplicated, order-stable control set of one rig instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlRegistry {
    controls: IndexSet<String>,
    custom_module: HashSet<String>,
    space_switches: Vec<String>,
}

impl ControlRegistry {
    /// Builds the registry from the live rig.
    ///
    /// Malformed descriptors are skipped with a warning.
    pub fn build(rig: &dyn RigHost) -> Self {
        let mut registry = Self::default();
        for control in FIXED_CONTROLS {
            registry.controls.insert((*control).to_string());
        }

        let nodes = rig.list_nodes();

        for raw in rig.module_descriptors() {
            let Some(descriptor) = ModuleDescriptor::parse(&raw) else {
                warn!(descriptor = %raw, "Skipping malformed custom module descriptor");
                continue;
            };
            debug!(label = %descriptor.label, kind = ?descriptor.kind, "Registering custom module");

            let mut controls = Vec::new();
            let declared = descriptor.declared_controls();
            // The dyn control comes first, then discovered IK controls.
            let mut declared = declared.into_iter();
            controls.extend(declared.next());
            if let Some(pattern) = descriptor.ik_pattern() {
                controls.extend(nodes.iter().filter(|n| pattern.is_match(n)).cloned());
            }
            controls.extend(declared);

            for control in controls {
                if FIXED_CONTROLS.contains(&control.as_str()) {
                    debug!(control = %control, "Custom module control collides with a fixed control");
                    continue;
                }
                registry.custom_module.insert(control.clone());
                registry.controls.insert(control);
            }
        }

        for node in &nodes {
            if node.contains("invis") {
                continue;
            }
            if let Some(parent) = node.strip_suffix("_follow") {
                if node.ends_with(SPACE_SWITCH_FOLLOW_SUFFIX) {
                    let parent = parent.to_string();
                    registry.controls.insert(parent.clone());
                    if !registry.space_switches.contains(&parent) {
                        registry.space_switches.push(parent);
                    }
                }
            }
        }

        debug!(
            controls = registry.controls.len(),
            custom = registry.custom_module.len(),
            space_switches = registry.space_switches.len(),
            "Built control registry"
        );
        registry
    }

    /// Builds a registry from an explicit control list (no rig discovery).
    pub fn from_controls<I, S>(controls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::default();
        for control in controls {
            let control = control.into();
            if control.ends_with("_space_switcher") {
                registry.space_switches.push(control.clone());
            }
            registry.controls.insert(control);
        }
        registry
    }

    /// All controls in registration order.
    pub fn controls(&self) -> impl Iterator<Item = &str> {
        self.controls.iter().map(String::as_str)
    }

    /// Space switch nodes, by parent control name.
    pub fn space_switches(&self) -> &[String] {
        &self.space_switches
    }

    /// Returns true if the control is registered.
    pub fn contains(&self, control: &str) -> bool {
        self.controls.contains(control)
    }

    /// Returns true if the control belongs to a custom module.
    pub fn is_custom_module(&self, control: &str) -> bool {
        self.custom_module.contains(control)
    }

    /// Returns true if the control is a space switch node.
    pub fn is_space_switch(&self, control: &str) -> bool {
        self.space_switches.iter().any(|s| s == control)
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_rig::{Control, MemoryRig};

    #[test]
    fn test_parse_descriptors() {
        let leaf = ModuleDescriptor::parse("root/leaf/prop (x)").unwrap();
        assert_eq!(leaf.kind, ModuleKind::Leaf);
        assert_eq!(leaf.declared_controls(), vec!["prop_anim"]);

        let jiggle = ModuleDescriptor::parse("spine_03/jiggle/belly").unwrap();
        assert_eq!(jiggle.declared_controls(), vec!["belly_anim"]);

        let chain = ModuleDescriptor::parse("head/chain/tail (2)").unwrap();
        assert_eq!(
            chain.declared_controls(),
            vec![
                "tail_dyn_anim",
                "fk_tail_01_anim",
                "tail_cv_0_anim",
                "fk_tail_02_anim",
                "tail_cv_1_anim",
            ]
        );
    }

    #[test]
    fn test_malformed_descriptors() {
        assert!(ModuleDescriptor::parse("nothing").is_none());
        assert!(ModuleDescriptor::parse("a/unknown/b").is_none());
        assert!(ModuleDescriptor::parse("a/chain/tail").is_none());
        assert!(ModuleDescriptor::parse("a/chain/tail (many)").is_none());
        assert!(ModuleDescriptor::parse("a/leaf/").is_none());
    }

    #[test]
    fn test_build_from_rig() {
        let rig = MemoryRig::new()
            .with_descriptor("head/chain/tail (1)")
            .with_descriptor("broken")
            .with_descriptor("spine_03/jiggle/belly")
            .with_node("tail_ik_base_anim")
            .with_node("tail_ik_tip_anim")
            .with_node("ik_wrist_l_anim_space_switcher_follow")
            .with_node("ik_wrist_l_anim_space_switcher_invis_follow");

        let registry = ControlRegistry::build(&rig);

        assert!(registry.contains("head_fk_anim"));
        assert!(registry.contains("Rig_Settings"));
        assert!(registry.is_custom_module("tail_ik_tip_anim"));
        assert!(registry.is_custom_module("tail_cv_0_anim"));
        assert!(registry.is_custom_module("belly_anim"));
        assert!(!registry.is_custom_module("hip_anim"));
        assert_eq!(
            registry.space_switches(),
            &["ik_wrist_l_anim_space_switcher".to_string()]
        );
        assert_eq!(registry.len(), FIXED_CONTROLS.len() + 6 + 1);

        let tail: Vec<_> = registry.controls().filter(|c| c.contains("tail")).collect();
        assert_eq!(
            tail,
            [
                "tail_dyn_anim",
                "tail_ik_base_anim",
                "tail_ik_tip_anim",
                "fk_tail_01_anim",
                "tail_cv_0_anim",
            ]
        );
    }

    #[test]
    fn test_duplicates_collapse() {
        let rig = MemoryRig::new()
            .with_descriptor("a/leaf/hip")
            .with_descriptor("a/leaf/hip");
        let registry = ControlRegistry::build(&rig);
        assert_eq!(registry.len(), FIXED_CONTROLS.len());
        assert!(!registry.is_custom_module("hip_anim"));
    }

    #[test]
    fn test_chain_segment_names_past_nine() {
        let rig = MemoryRig::new()
            .with_descriptor("head/chain/tail (10)")
            .with_node("fk_tail_09_anim")
            .with_node("fk_tail_010_anim");

        let registry = ControlRegistry::build(&rig);

        assert!(registry.contains("fk_tail_09_anim"));
        assert!(registry.contains("fk_tail_010_anim"));
        assert!(!registry.contains("fk_tail_10_anim"));
        assert!(registry.is_custom_module("tail_cv_9_anim"));
    }

    #[test]
    fn test_space_switch_listed_twice() {
        let rig = MemoryRig::new()
            .with_control("prop_space_switcher_follow", Control::transform())
            .with_node("prop_space_switcher_follow");

        let registry = ControlRegistry::build(&rig);

        assert_eq!(registry.space_switches(), &["prop_space_switcher".to_string()]);
        assert!(registry.is_space_switch("prop_space_switcher"));
        assert_eq!(
            registry.controls().filter(|c| *c == "prop_space_switcher").count(),
            1
        );
    }
}

//! Declarative per-group mirror rules.
//!
//! Local axis conventions differ between control groups, so attribute
//! mirroring is looked up in a table of name patterns rather than derived from
//! one formula. The first matching rule wins.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PoseError, PoseResult};
use crate::host::Channel;

/// How a control receives its mirrored values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum MirrorStrategy {
    /// Snap to the reflected marker position, then optionally copy the
    /// recorded rotation with some channels negated.
    Resolve {
        #[serde(default)]
        copy_rotation: bool,
        #[serde(default)]
        negate: Vec<Channel>,
    },
    /// Copy recorded channels directly, negating some.
    Direct {
        channels: Vec<Channel>,
        #[serde(default)]
        negate: Vec<Channel>,
    },
    /// Leave the control as applied.
    Keep,
}

impl MirrorStrategy {
    /// Copy of raw rotation, unmirrored.
    pub fn copy_rotation() -> Self {
        MirrorStrategy::Direct {
            channels: Channel::ROTATE.to_vec(),
            negate: Vec::new(),
        }
    }
}

/// One pattern-matched rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MirrorRule {
    /// Regular expression matched against the target control name.
    pub pattern: String,
    /// Live mirror strategy.
    pub strategy: MirrorStrategy,
    /// Channels negated when pasting recorded data onto the opposite side.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paste_negate: Vec<Channel>,
}

/// Scalar attributes swapped wholesale between a left/right control pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PairedAttributes {
    pub left: String,
    pub right: String,
    pub attributes: Vec<String>,
}

/// Serialized form of a rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSet {
    pub rules: Vec<MirrorRule>,
    /// Strategy for custom module controls (except control-vertex controls).
    pub custom_module: MirrorStrategy,
    #[serde(default)]
    pub paired: Vec<PairedAttributes>,
}

/// Result of a rule lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMatch<'a> {
    Rule(&'a MirrorRule),
    CustomModule(&'a MirrorStrategy),
    Unsupported,
}

impl<'a> RuleMatch<'a> {
    /// Strategy to use; unsupported controls fall back to an unmirrored
    /// rotation copy.
    pub fn strategy(&self) -> MirrorStrategy {
        match self {
            RuleMatch::Rule(rule) => rule.strategy.clone(),
            RuleMatch::CustomModule(strategy) => (*strategy).clone(),
            RuleMatch::Unsupported => MirrorStrategy::copy_rotation(),
        }
    }

    /// Paste-opposite negation mask.
    pub fn paste_negate(&self) -> &'a [Channel] {
        match self {
            RuleMatch::Rule(rule) => &rule.paste_negate,
            _ => &[],
        }
    }
}

/// A compiled, immutable rule table.
#[derive(Debug, Clone)]
pub struct MirrorRuleTable {
    set: RuleSet,
    compiled: Vec<Regex>,
}

impl MirrorRuleTable {
    /// Compiles a rule set.
    pub fn new(set: RuleSet) -> PoseResult<Self> {
        let compiled = set
            .rules
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern).map_err(|source| PoseError::InvalidRule {
                    pattern: rule.pattern.clone(),
                    source,
                })
            })
            .collect::<PoseResult<Vec<_>>>()?;
        Ok(Self { set, compiled })
    }

    /// Parses and compiles a JSON rule set.
    pub fn from_json(json: &str) -> PoseResult<Self> {
        Self::new(serde_json::from_str(json)?)
    }

    /// The built-in rule table for the standard rig.
    pub fn builtin() -> Self {
        Self::new_lenient(builtin_rules())
    }

    /// Compiles a rule set, dropping rules whose pattern does not compile.
    ///
    /// Dropped rules are removed from the set as well so lookups stay
    /// aligned, and each one is logged.
    pub fn new_lenient(mut set: RuleSet) -> Self {
        let mut compiled = Vec::with_capacity(set.rules.len());
        set.rules.retain(|rule| match Regex::new(&rule.pattern) {
            Ok(re) => {
                compiled.push(re);
                true
            }
            Err(e) => {
                warn!(pattern = %rule.pattern, error = %e, "Dropping mirror rule with invalid pattern");
                false
            }
        });
        Self { set, compiled }
    }

    /// Underlying rule set.
    pub fn rule_set(&self) -> &RuleSet {
        &self.set
    }

    /// Paired attribute swaps.
    pub fn paired(&self) -> &[PairedAttributes] {
        &self.set.paired
    }

    /// Looks up the rule for a target control.
    ///
    /// Custom module controls use the module strategy unless they are
    /// control-vertex controls, which go through the pattern rules.
    pub fn lookup(&self, control: &str, custom_module: bool) -> RuleMatch<'_> {
        if custom_module && !control.contains("_cv_") {
            return RuleMatch::CustomModule(&self.set.custom_module);
        }
        self.compiled
            .iter()
            .zip(&self.set.rules)
            .find(|(re, _)| re.is_match(control))
            .map(|(_, rule)| RuleMatch::Rule(rule))
            .unwrap_or(RuleMatch::Unsupported)
    }

    /// Serializes the rule set as pretty JSON.
    pub fn to_json_pretty(&self) -> PoseResult<String> {
        Ok(serde_json::to_string_pretty(&self.set)?)
    }
}

impl Default for MirrorRuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn rule(pattern: &str, strategy: MirrorStrategy, paste_negate: &[Channel]) -> MirrorRule {
    MirrorRule {
        pattern: pattern.to_string(),
        strategy,
        paste_negate: paste_negate.to_vec(),
    }
}

fn resolve(copy_rotation: bool, negate: &[Channel]) -> MirrorStrategy {
    MirrorStrategy::Resolve {
        copy_rotation,
        negate: negate.to_vec(),
    }
}

fn builtin_rules() -> RuleSet {
    use Channel::*;

    RuleSet {
        rules: vec![
            rule("^Rig_Settings$", MirrorStrategy::Keep, &[]),
            rule("_space_switcher$", MirrorStrategy::Keep, &[]),
            rule("^[lr]_global_ik_anim$", MirrorStrategy::Keep, &[]),
            rule(
                "_cv_\\d+_anim$",
                MirrorStrategy::Direct {
                    channels: Channel::ALL.to_vec(),
                    negate: Vec::new(),
                },
                &[],
            ),
            rule(
                "^mid_ik_anim$",
                MirrorStrategy::Direct {
                    channels: Channel::ALL.to_vec(),
                    negate: vec![Ty, Tz, Rx, Ry],
                },
                &[],
            ),
            rule(
                "^(master|offset|root|body|hip)_anim$|^chest_ik_anim$|^spine_\\d+_anim$|^neck_\\d+_fk_anim$|^head_fk_anim$",
                resolve(true, &[Rx, Ry]),
                &[],
            ),
            rule("^clavicle_[lr]_anim$", resolve(false, &[]), &[Tx]),
            rule(
                "^ik_wrist_[lr]_anim$|^ik_foot_anim_[lr]$",
                resolve(true, &[Ry, Rz]),
                &[Tx, Ry, Rz],
            ),
            rule("^ik_elbow_[lr]_anim$", resolve(false, &[]), &[Tx]),
            rule("^ik_knee_", resolve(false, &[]), &[]),
            rule(
                "^(index|middle|ring|pinky)_(metacarpal|finger)|^thumb_finger",
                MirrorStrategy::copy_rotation(),
                &[],
            ),
            rule(
                "^(index|middle|ring|pinky|thumb)_[lr]_(ik_anim|poleVector)$",
                resolve(true, &[]),
                &[],
            ),
            rule(
                "^(heel_ctrl|toe_wiggle_ctrl|toe_tip_ctrl)_[lr]$",
                MirrorStrategy::copy_rotation(),
                &[],
            ),
            rule("_twist_anim$", MirrorStrategy::copy_rotation(), &[]),
            rule("^fk_", MirrorStrategy::copy_rotation(), &[]),
        ],
        custom_module: resolve(true, &[]),
        paired: vec![
            PairedAttributes {
                left: "ik_wrist_l_anim".to_string(),
                right: "ik_wrist_r_anim".to_string(),
                attributes: ["mid_bend", "mid_swivel", "tip_pivot", "tip_swivel"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            PairedAttributes {
                left: "ik_foot_anim_l".to_string(),
                right: "ik_foot_anim_r".to_string(),
                attributes: vec!["knee_twist".to_string()],
            },
        ],
    }
}

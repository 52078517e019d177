//! FK/IK authoring mode types.
//!
//! Each limb of the rig is authored either through forward-kinematics
//! rotations or an inverse-kinematics target. The active mode lives on the
//! rig settings node as one toggle attribute per limb.

use serde::{Deserialize, Serialize};

use crate::error::RigResult;
use crate::host::RigHost;

/// Node carrying the per-limb mode toggles.
pub const RIG_SETTINGS: &str = "Rig_Settings";

/// FK/IK control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IkFkMode {
    /// Forward Kinematics mode (rotation-driven).
    #[default]
    Fk,
    /// Inverse Kinematics mode (target-driven).
    Ik,
}

impl IkFkMode {
    /// Decodes a toggle attribute value (0 = FK, 1 = IK).
    pub fn from_toggle(value: f64) -> Self {
        if value >= 0.5 {
            IkFkMode::Ik
        } else {
            IkFkMode::Fk
        }
    }

    /// Encodes this mode as a toggle attribute value.
    pub fn toggle_value(&self) -> f64 {
        match self {
            IkFkMode::Fk => 0.0,
            IkFkMode::Ik => 1.0,
        }
    }

    /// Returns the other mode.
    pub fn other(&self) -> Self {
        match self {
            IkFkMode::Fk => IkFkMode::Ik,
            IkFkMode::Ik => IkFkMode::Fk,
        }
    }
}

impl std::fmt::Display for IkFkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IkFkMode::Fk => write!(f, "FK"),
            IkFkMode::Ik => write!(f, "IK"),
        }
    }
}

/// Body side of a limb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Returns the naming token for this side (`l` or `r`).
    pub fn token(&self) -> &'static str {
        match self {
            Side::Left => "l",
            Side::Right => "r",
        }
    }

    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// A limb with an independent FK/IK toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limb {
    Spine,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
}

impl Limb {
    /// All limbs in reconciliation order.
    pub const ALL: [Limb; 5] = [
        Limb::Spine,
        Limb::LeftArm,
        Limb::RightArm,
        Limb::LeftLeg,
        Limb::RightLeg,
    ];

    /// Attribute on [`RIG_SETTINGS`] holding this limb's mode.
    pub fn toggle_attribute(&self) -> &'static str {
        match self {
            Limb::Spine => "spine_ik",
            Limb::LeftArm => "lArmMode",
            Limb::RightArm => "rArmMode",
            Limb::LeftLeg => "lLegMode",
            Limb::RightLeg => "rLegMode",
        }
    }

    /// Inverse toggle kept in sync with the primary one, if any.
    pub fn complement_attribute(&self) -> Option<&'static str> {
        match self {
            Limb::Spine => Some("spine_fk"),
            _ => None,
        }
    }

    /// Limb family name understood by match operations.
    pub fn family(&self) -> &'static str {
        match self {
            Limb::Spine => "spine",
            Limb::LeftArm | Limb::RightArm => "arm",
            Limb::LeftLeg | Limb::RightLeg => "leg",
        }
    }

    /// Side of the limb, `None` for the spine.
    pub fn side(&self) -> Option<Side> {
        match self {
            Limb::Spine => None,
            Limb::LeftArm | Limb::LeftLeg => Some(Side::Left),
            Limb::RightArm | Limb::RightLeg => Some(Side::Right),
        }
    }

    /// Reads the limb's current mode from the rig.
    pub fn read(&self, rig: &dyn RigHost) -> RigResult<IkFkMode> {
        rig.get_attr(RIG_SETTINGS, self.toggle_attribute())
            .map(IkFkMode::from_toggle)
    }

    /// Writes the limb's mode toggle (and its complement) without keying.
    pub fn write(&self, rig: &mut dyn RigHost, mode: IkFkMode) -> RigResult<()> {
        rig.set_attr(RIG_SETTINGS, self.toggle_attribute(), mode.toggle_value())?;
        if let Some(complement) = self.complement_attribute() {
            rig.set_attr(RIG_SETTINGS, complement, mode.other().toggle_value())?;
        }
        Ok(())
    }

    /// Keys the limb's toggle attributes at the current time.
    pub fn key(&self, rig: &mut dyn RigHost) -> RigResult<()> {
        rig.set_key(RIG_SETTINGS, Some(self.toggle_attribute()))?;
        if let Some(complement) = self.complement_attribute() {
            rig.set_key(RIG_SETTINGS, Some(complement))?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Limb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.side() {
            Some(side) => write!(f, "{} {}", side.token(), self.family()),
            None => write!(f, "{}", self.family()),
        }
    }
}

/// Mode of all five limbs at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RigModeState {
    pub spine: IkFkMode,
    pub left_arm: IkFkMode,
    pub right_arm: IkFkMode,
    pub left_leg: IkFkMode,
    pub right_leg: IkFkMode,
}

impl RigModeState {
    /// Reads every limb toggle from the rig.
    pub fn capture(rig: &dyn RigHost) -> RigResult<Self> {
        Ok(Self {
            spine: Limb::Spine.read(rig)?,
            left_arm: Limb::LeftArm.read(rig)?,
            right_arm: Limb::RightArm.read(rig)?,
            left_leg: Limb::LeftLeg.read(rig)?,
            right_leg: Limb::RightLeg.read(rig)?,
        })
    }

    /// Returns the recorded mode of one limb.
    pub fn get(&self, limb: Limb) -> IkFkMode {
        match limb {
            Limb::Spine => self.spine,
            Limb::LeftArm => self.left_arm,
            Limb::RightArm => self.right_arm,
            Limb::LeftLeg => self.left_leg,
            Limb::RightLeg => self.right_leg,
        }
    }

    /// Sets the mode of one limb.
    pub fn with(mut self, limb: Limb, mode: IkFkMode) -> Self {
        match limb {
            Limb::Spine => self.spine = mode,
            Limb::LeftArm => self.left_arm = mode,
            Limb::RightArm => self.right_arm = mode,
            Limb::LeftLeg => self.left_leg = mode,
            Limb::RightLeg => self.right_leg = mode,
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_round_trip() {
        assert_eq!(IkFkMode::from_toggle(0.0), IkFkMode::Fk);
        assert_eq!(IkFkMode::from_toggle(1.0), IkFkMode::Ik);
        assert_eq!(IkFkMode::Ik.toggle_value(), 1.0);
        assert_eq!(IkFkMode::Fk.other(), IkFkMode::Ik);
    }

    #[test]
    fn test_limb_order_and_attributes() {
        let attrs: Vec<_> = Limb::ALL.iter().map(|l| l.toggle_attribute()).collect();
        assert_eq!(
            attrs,
            ["spine_ik", "lArmMode", "rArmMode", "lLegMode", "rLegMode"]
        );
        assert_eq!(Limb::Spine.complement_attribute(), Some("spine_fk"));
        assert_eq!(Limb::RightLeg.side(), Some(Side::Right));
        assert_eq!(Limb::LeftArm.to_string(), "l arm");
    }

    #[test]
    fn test_state_with() {
        let state = RigModeState::default().with(Limb::LeftLeg, IkFkMode::Ik);
        assert_eq!(state.get(Limb::LeftLeg), IkFkMode::Ik);
        assert_eq!(state.get(Limb::RightLeg), IkFkMode::Fk);
    }
}

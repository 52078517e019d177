//! Collaborator contracts: the live rig and the external decisions the
//! core depends on.
//!
//! The engine never talks to a DCC application directly. Everything it needs
//! from the scene goes through [`RigHost`]; FK/IK conversion goes through
//! [`LimbMatcher`]; overwrite and read-only recovery prompts go through
//! [`StoreDelegate`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RigResult;
use crate::mode::{IkFkMode, Limb};

// =============================================================================
// Rig Host
// =============================================================================

/// Access to one live rig instance.
///
/// Control names are unqualified; the host resolves them inside its own
/// rig instance (namespace, character prefix, ...).
pub trait RigHost {
    /// Returns true if the control exists on the rig.
    fn control_exists(&self, control: &str) -> bool;

    /// Lists the keyable, unlocked attributes of a control in host order.
    fn keyable_attributes(&self, control: &str) -> RigResult<Vec<String>>;

    /// Returns true if the attribute exists, is keyable and is unlocked.
    fn is_keyable(&self, control: &str, attribute: &str) -> bool;

    /// Reads an attribute value.
    fn get_attr(&self, control: &str, attribute: &str) -> RigResult<f64>;

    /// Writes an attribute value.
    fn set_attr(&mut self, control: &str, attribute: &str, value: f64) -> RigResult<()>;

    /// Resets every keyable attribute of a control to its neutral default.
    fn reset_control(&mut self, control: &str) -> RigResult<()>;

    /// Keys one attribute, or every keyable attribute when `attribute` is
    /// `None`, at the current time.
    fn set_key(&mut self, control: &str, attribute: Option<&str>) -> RigResult<()>;

    /// Current timeline position.
    fn current_time(&self) -> f64;

    /// Moves the timeline, re-evaluating dependents.
    fn set_current_time(&mut self, time: f64);

    /// World-space position of a control's pivot.
    fn world_position(&self, control: &str) -> RigResult<[f64; 3]>;

    /// Moves a control so its pivot lands on `position` (point-constraint
    /// semantics: solved, written to the control's channels, then released).
    fn set_world_position(&mut self, control: &str, position: [f64; 3]) -> RigResult<()>;

    /// Lists every node name in the rig instance.
    fn list_nodes(&self) -> Vec<String>;

    /// Raw custom-module descriptor strings attached to the rig.
    fn module_descriptors(&self) -> Vec<String>;

    /// Names of the skin-bound meshes of the rig.
    fn skinned_meshes(&self) -> Vec<String>;

    /// Duplicates a mesh, returning the duplicate's name.
    fn duplicate_mesh(&mut self, mesh: &str) -> RigResult<String>;

    /// Unlocks, unparents and freezes a node's transform.
    fn freeze_transform(&mut self, node: &str) -> RigResult<()>;

    /// Combines meshes into one new mesh named `name`, deleting the inputs.
    fn unite_meshes(&mut self, meshes: &[String], name: &str) -> RigResult<String>;

    /// Renames a node, returning the final name.
    fn rename_node(&mut self, node: &str, name: &str) -> RigResult<String>;

    /// Creates a surface material.
    fn create_material(
        &mut self,
        name: &str,
        color: [f64; 3],
        incandescence: [f64; 3],
    ) -> RigResult<String>;

    /// Assigns a material to a mesh.
    fn assign_material(&mut self, node: &str, material: &str) -> RigResult<()>;

    /// World transform of a scene node.
    fn node_transform(&self, node: &str) -> RigResult<NodeTransform>;

    /// Deletes a scene node.
    fn delete_node(&mut self, node: &str) -> RigResult<()>;

    /// Steps the timeline back one unit and forward again to force
    /// dependent re-evaluation.
    fn refresh_timeline(&mut self) {
        let now = self.current_time();
        self.set_current_time(now - 1.0);
        self.set_current_time(now);
    }
}

/// Strips a `namespace:` prefix from a node name.
pub fn strip_namespace(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

// =============================================================================
// Node Transforms
// =============================================================================

/// Translation, rotation and scale of a scene node.
///
/// Rotation is in degrees, applied in XYZ order (X first). Points map to
/// world space as `translation + R * (scale * p)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeTransform {
    pub translation: [f64; 3],
    pub rotation: [f64; 3],
    pub scale: [f64; 3],
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl NodeTransform {
    /// A pure translation.
    pub fn from_translation(translation: [f64; 3]) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    /// Row-major rotation matrix, `Rz * Ry * Rx`.
    fn rotation_matrix(&self) -> [[f64; 3]; 3] {
        let [x, y, z] = self.rotation.map(f64::to_radians);
        let (sx, cx) = x.sin_cos();
        let (sy, cy) = y.sin_cos();
        let (sz, cz) = z.sin_cos();
        [
            [cy * cz, sx * sy * cz - cx * sz, cx * sy * cz + sx * sz],
            [cy * sz, sx * sy * sz + cx * cz, cx * sy * sz - sx * cz],
            [-sy, sx * cy, cx * cy],
        ]
    }

    /// Maps a point from node space to world space.
    pub fn transform_point(&self, local: [f64; 3]) -> [f64; 3] {
        let m = self.rotation_matrix();
        let scaled = [
            local[0] * self.scale[0],
            local[1] * self.scale[1],
            local[2] * self.scale[2],
        ];
        let mut world = self.translation;
        for (row, out) in m.iter().zip(world.iter_mut()) {
            *out += row[0] * scaled[0] + row[1] * scaled[1] + row[2] * scaled[2];
        }
        world
    }

    /// Maps a world point into node space.
    ///
    /// Axes with zero scale collapse to zero.
    pub fn inverse_transform_point(&self, world: [f64; 3]) -> [f64; 3] {
        let m = self.rotation_matrix();
        let d = [
            world[0] - self.translation[0],
            world[1] - self.translation[1],
            world[2] - self.translation[2],
        ];
        let mut local = [0.0; 3];
        for (axis, out) in local.iter_mut().enumerate() {
            // The inverse of a rotation matrix is its transpose.
            let rotated = m[0][axis] * d[0] + m[1][axis] * d[1] + m[2][axis] * d[2];
            let scale = self.scale[axis];
            *out = if scale == 0.0 { 0.0 } else { rotated / scale };
        }
        local
    }
}

// =============================================================================
// Transform Channels
// =============================================================================

/// A transform channel of a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Tx,
    Ty,
    Tz,
    Rx,
    Ry,
    Rz,
}

impl Channel {
    /// Translation channels.
    pub const TRANSLATE: [Channel; 3] = [Channel::Tx, Channel::Ty, Channel::Tz];
    /// Rotation channels.
    pub const ROTATE: [Channel; 3] = [Channel::Rx, Channel::Ry, Channel::Rz];
    /// All six channels.
    pub const ALL: [Channel; 6] = [
        Channel::Tx,
        Channel::Ty,
        Channel::Tz,
        Channel::Rx,
        Channel::Ry,
        Channel::Rz,
    ];

    /// Short attribute name written to the rig.
    pub fn attribute(&self) -> &'static str {
        match self {
            Channel::Tx => "tx",
            Channel::Ty => "ty",
            Channel::Tz => "tz",
            Channel::Rx => "rx",
            Channel::Ry => "ry",
            Channel::Rz => "rz",
        }
    }

    /// Long attribute name.
    pub fn long_name(&self) -> &'static str {
        match self {
            Channel::Tx => "translateX",
            Channel::Ty => "translateY",
            Channel::Tz => "translateZ",
            Channel::Rx => "rotateX",
            Channel::Ry => "rotateY",
            Channel::Rz => "rotateZ",
        }
    }

    /// Resolves a short or long attribute name to a channel.
    pub fn from_attribute(attribute: &str) -> Option<Self> {
        Channel::ALL
            .into_iter()
            .find(|c| c.attribute() == attribute || c.long_name() == attribute)
    }

    /// Returns true for translation channels.
    pub fn is_translate(&self) -> bool {
        matches!(self, Channel::Tx | Channel::Ty | Channel::Tz)
    }
}

// =============================================================================
// External Operations
// =============================================================================

/// A request to convert one limb between FK and IK representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRequest {
    /// Limb to convert.
    pub limb: Limb,
    /// Mode the limb is currently in.
    pub from: IkFkMode,
    /// Mode the limb must be matched into.
    pub to: IkFkMode,
}

/// External FK/IK match-and-convert operation.
///
/// Given the pose currently on the rig, computes the equivalent pose in the
/// `to` representation for one limb. It must not flip the mode toggle
/// itself; the reconciler does that afterwards.
pub trait LimbMatcher {
    fn match_limb(&mut self, rig: &mut dyn RigHost, request: MatchRequest) -> RigResult<()>;
}

/// Outcome of a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Cancel,
}

/// External decisions needed by [`crate::store::PoseStore`].
pub trait StoreDelegate {
    /// A record already exists at `path`. Proceed overwrites it.
    fn confirm_overwrite(&mut self, path: &Path) -> Decision;

    /// `path` is read-only. Proceed means the caller made it writable
    /// (e.g. checked it out) and the operation should be retried once.
    fn recover_read_only(&mut self, path: &Path) -> Decision;
}

/// Delegate that declines every prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineAll;

impl StoreDelegate for DeclineAll {
    fn confirm_overwrite(&mut self, _path: &Path) -> Decision {
        Decision::Cancel
    }

    fn recover_read_only(&mut self, _path: &Path) -> Decision {
        Decision::Cancel
    }
}

/// Incremental progress reporting for long passes.
pub trait Progress {
    /// A pass with `total` steps is starting.
    fn begin(&mut self, _label: &str, _total: usize) {}
    /// One step of the current pass finished.
    fn step(&mut self) {}
    /// The current pass finished.
    fn finish(&mut self) {}
}

/// Progress sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_names() {
        assert_eq!(Channel::from_attribute("rotateY"), Some(Channel::Ry));
        assert_eq!(Channel::from_attribute("tz"), Some(Channel::Tz));
        assert_eq!(Channel::from_attribute("mid_bend"), None);
        assert!(Channel::Tx.is_translate());
        assert!(!Channel::Rz.is_translate());
    }

    fn assert_close(a: [f64; 3], b: [f64; 3]) {
        for axis in 0..3 {
            assert!((a[axis] - b[axis]).abs() < 1e-9, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_node_transform_points() {
        let identity = NodeTransform::from_translation([1.0, 2.0, 3.0]);
        assert_close(identity.transform_point([1.0, 0.0, 0.0]), [2.0, 2.0, 3.0]);

        let turned = NodeTransform {
            translation: [0.0, 0.0, 2.0],
            rotation: [0.0, 90.0, 0.0],
            scale: [2.0; 3],
        };
        // +X turns onto -Z under a 90 degree Y rotation.
        assert_close(turned.transform_point([1.0, 0.0, 0.0]), [0.0, 0.0, 0.0]);
        assert_close(turned.transform_point([0.0, 1.0, 0.0]), [0.0, 2.0, 2.0]);

        let spun = NodeTransform {
            translation: [5.0, -1.0, 0.5],
            rotation: [30.0, -45.0, 120.0],
            scale: [1.0, 0.5, 3.0],
        };
        let local = [0.25, -4.0, 7.0];
        assert_close(spun.inverse_transform_point(spun.transform_point(local)), local);
    }

    #[test]
    fn test_strip_namespace() {
        assert_eq!(strip_namespace("hero:hip_anim"), "hip_anim");
        assert_eq!(strip_namespace("a:b:hip_anim"), "hip_anim");
        assert_eq!(strip_namespace("hip_anim"), "hip_anim");
    }

    #[test]
    fn test_decline_all() {
        let mut delegate = DeclineAll;
        assert_eq!(
            delegate.confirm_overwrite(Path::new("a.json")),
            Decision::Cancel
        );
        assert_eq!(
            delegate.recover_read_only(Path::new("a.json")),
            Decision::Cancel
        );
    }
}

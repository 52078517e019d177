//! In-memory rig implementing [`RigHost`].
//!
//! Used by tests and by the command-line tool, which loads and saves the rig
//! as a JSON "scene" file. The model is deliberately flat: every control has a
//! parent origin and its world position is that origin plus its translate
//! channels.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::error::{RigError, RigResult};
use crate::host::{NodeTransform, RigHost};

// =============================================================================
// Scene Model
// =============================================================================

/// One scalar attribute on a control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Attribute {
    /// Current value.
    pub value: f64,
    /// Neutral value restored by a reset.
    #[serde(default)]
    pub default: f64,
    /// Whether the attribute shows up in the keyable list.
    #[serde(default = "default_true")]
    pub keyable: bool,
    /// Locked attributes reject writes.
    #[serde(default)]
    pub locked: bool,
}

fn default_true() -> bool {
    true
}

impl Attribute {
    /// Creates a keyable, unlocked attribute with the given neutral default.
    pub fn new(value: f64, default: f64) -> Self {
        Self {
            value,
            default,
            keyable: true,
            locked: false,
        }
    }

    fn is_writable_key(&self) -> bool {
        self.keyable && !self.locked
    }
}

/// A control: ordered attributes plus the world origin of its parent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Control {
    /// World-space origin the translate channels are relative to.
    #[serde(default)]
    pub parent_origin: [f64; 3],
    /// Attributes in host order.
    #[serde(default)]
    pub attributes: IndexMap<String, Attribute>,
}

impl Control {
    /// Creates a control without attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a control with zeroed translate/rotate channels and unit scale.
    pub fn transform() -> Self {
        Self::new()
            .attr("tx", 0.0)
            .attr("ty", 0.0)
            .attr("tz", 0.0)
            .attr("rx", 0.0)
            .attr("ry", 0.0)
            .attr("rz", 0.0)
            .attr_with_default("sx", 1.0, 1.0)
            .attr_with_default("sy", 1.0, 1.0)
            .attr_with_default("sz", 1.0, 1.0)
    }

    /// Creates a control with only rotation channels.
    pub fn rotation() -> Self {
        Self::new().attr("rx", 0.0).attr("ry", 0.0).attr("rz", 0.0)
    }

    /// Sets the parent origin.
    pub fn at(mut self, origin: [f64; 3]) -> Self {
        self.parent_origin = origin;
        self
    }

    /// Adds (or replaces) a keyable attribute with neutral default 0.
    pub fn attr(self, name: impl Into<String>, value: f64) -> Self {
        self.attr_with_default(name, value, 0.0)
    }

    /// Adds (or replaces) a keyable attribute with an explicit default.
    pub fn attr_with_default(mut self, name: impl Into<String>, value: f64, default: f64) -> Self {
        self.attributes
            .insert(name.into(), Attribute::new(value, default));
        self
    }

    /// Adds a locked attribute.
    pub fn locked_attr(mut self, name: impl Into<String>, value: f64) -> Self {
        let mut attribute = Attribute::new(value, 0.0);
        attribute.locked = true;
        self.attributes.insert(name.into(), attribute);
        self
    }

    /// Sets an attribute value in place, ignoring locks.
    pub fn set(mut self, name: &str, value: f64) -> Self {
        if let Some(attribute) = self.attributes.get_mut(name) {
            attribute.value = value;
        }
        self
    }
}

/// A keyframe written by [`RigHost::set_key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub control: String,
    pub attribute: String,
    pub time: f64,
    pub value: f64,
}

fn unit_scale() -> [f64; 3] {
    [1.0; 3]
}

/// A mesh node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeshNode {
    /// Local translation.
    #[serde(default)]
    pub translation: [f64; 3],
    /// Local rotation in degrees, XYZ order.
    #[serde(default)]
    pub rotation: [f64; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f64; 3],
    /// Whether the mesh is skin-bound to the rig.
    #[serde(default)]
    pub skinned: bool,
    /// Whether transform channels are locked.
    #[serde(default)]
    pub locked: bool,
    /// Parent node, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Assigned material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

impl Default for MeshNode {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0; 3],
            scale: unit_scale(),
            skinned: false,
            locked: false,
            parent: None,
            material: None,
        }
    }
}

impl MeshNode {
    /// The node's transform. Meshes are unparented once frozen, so the local
    /// transform is also the world transform.
    pub fn transform(&self) -> NodeTransform {
        NodeTransform {
            translation: self.translation,
            rotation: self.rotation,
            scale: self.scale,
        }
    }
}

/// A surface material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub color: [f64; 3],
    pub incandescence: [f64; 3],
}

/// A complete in-memory rig scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryRig {
    /// Controls by name, in creation order.
    #[serde(default)]
    pub controls: IndexMap<String, Control>,
    /// Additional non-control nodes (space switcher follow nodes, helpers).
    #[serde(default)]
    pub nodes: IndexSet<String>,
    /// Raw custom-module descriptor strings.
    #[serde(default)]
    pub module_descriptors: Vec<String>,
    /// Mesh nodes by name.
    #[serde(default)]
    pub meshes: IndexMap<String, MeshNode>,
    /// Materials by name.
    #[serde(default)]
    pub materials: IndexMap<String, Material>,
    /// Current selection.
    #[serde(default)]
    pub selection: Vec<String>,
    /// Current time.
    #[serde(default)]
    pub time: f64,
    /// Keyframes in write order.
    #[serde(default)]
    pub keys: Vec<Keyframe>,
}

impl MemoryRig {
    /// Creates an empty rig.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a control.
    pub fn with_control(mut self, name: impl Into<String>, control: Control) -> Self {
        self.controls.insert(name.into(), control);
        self
    }

    /// Adds a plain node.
    pub fn with_node(mut self, name: impl Into<String>) -> Self {
        self.nodes.insert(name.into());
        self
    }

    /// Adds a custom-module descriptor.
    pub fn with_descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.module_descriptors.push(descriptor.into());
        self
    }

    /// Adds a skin-bound mesh.
    pub fn with_skinned_mesh(mut self, name: impl Into<String>, translation: [f64; 3]) -> Self {
        self.meshes.insert(
            name.into(),
            MeshNode {
                translation,
                skinned: true,
                locked: true,
                parent: Some("rig".to_string()),
                ..MeshNode::default()
            },
        );
        self
    }

    /// Sets the selection.
    pub fn with_selection<I, S>(mut self, selection: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection = selection.into_iter().map(Into::into).collect();
        self
    }

    /// Reads a value, `None` if the control or attribute is missing.
    pub fn value(&self, control: &str, attribute: &str) -> Option<f64> {
        self.controls
            .get(control)
            .and_then(|c| c.attributes.get(attribute))
            .map(|a| a.value)
    }

    /// Keyframes written for one attribute.
    pub fn keys_for<'a>(
        &'a self,
        control: &'a str,
        attribute: &'a str,
    ) -> impl Iterator<Item = &'a Keyframe> + 'a {
        self.keys
            .iter()
            .filter(move |k| k.control == control && k.attribute == attribute)
    }

    /// Parses a scene from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the scene to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    fn control(&self, control: &str) -> RigResult<&Control> {
        self.controls
            .get(control)
            .ok_or_else(|| RigError::MissingControl(control.to_string()))
    }

    fn control_mut(&mut self, control: &str) -> RigResult<&mut Control> {
        self.controls
            .get_mut(control)
            .ok_or_else(|| RigError::MissingControl(control.to_string()))
    }

    fn mesh(&self, node: &str) -> RigResult<&MeshNode> {
        self.meshes
            .get(node)
            .ok_or_else(|| RigError::MissingNode(node.to_string()))
    }

    fn mesh_mut(&mut self, node: &str) -> RigResult<&mut MeshNode> {
        self.meshes
            .get_mut(node)
            .ok_or_else(|| RigError::MissingNode(node.to_string()))
    }

    fn has_node(&self, name: &str) -> bool {
        self.controls.contains_key(name)
            || self.nodes.contains(name)
            || self.meshes.contains_key(name)
            || self.materials.contains_key(name)
    }

    fn unique_name(&self, base: &str) -> String {
        if !self.has_node(base) {
            return base.to_string();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}{}", base, n);
            if !self.has_node(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn record_key(&mut self, control: &str, attribute: &str, value: f64) {
        let time = self.time;
        if let Some(existing) = self
            .keys
            .iter_mut()
            .find(|k| k.control == control && k.attribute == attribute && k.time == time)
        {
            existing.value = value;
            return;
        }
        self.keys.push(Keyframe {
            control: control.to_string(),
            attribute: attribute.to_string(),
            time,
            value,
        });
    }
}

// =============================================================================
// RigHost
// =============================================================================

impl RigHost for MemoryRig {
    fn control_exists(&self, control: &str) -> bool {
        self.controls.contains_key(control)
    }

    fn keyable_attributes(&self, control: &str) -> RigResult<Vec<String>> {
        Ok(self
            .control(control)?
            .attributes
            .iter()
            .filter(|(_, a)| a.is_writable_key())
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn is_keyable(&self, control: &str, attribute: &str) -> bool {
        self.controls
            .get(control)
            .and_then(|c| c.attributes.get(attribute))
            .map(Attribute::is_writable_key)
            .unwrap_or(false)
    }

    fn get_attr(&self, control: &str, attribute: &str) -> RigResult<f64> {
        self.control(control)?
            .attributes
            .get(attribute)
            .map(|a| a.value)
            .ok_or_else(|| RigError::missing_attribute(control, attribute))
    }

    fn set_attr(&mut self, control: &str, attribute: &str, value: f64) -> RigResult<()> {
        let slot = self
            .control_mut(control)?
            .attributes
            .get_mut(attribute)
            .ok_or_else(|| RigError::missing_attribute(control, attribute))?;
        if slot.locked {
            return Err(RigError::Locked {
                control: control.to_string(),
                attribute: attribute.to_string(),
            });
        }
        slot.value = value;
        Ok(())
    }

    fn reset_control(&mut self, control: &str) -> RigResult<()> {
        for attribute in self.control_mut(control)?.attributes.values_mut() {
            if attribute.is_writable_key() {
                attribute.value = attribute.default;
            }
        }
        Ok(())
    }

    fn set_key(&mut self, control: &str, attribute: Option<&str>) -> RigResult<()> {
        let targets: Vec<(String, f64)> = {
            let ctrl = self.control(control)?;
            match attribute {
                Some(name) => {
                    let attr = ctrl
                        .attributes
                        .get(name)
                        .ok_or_else(|| RigError::missing_attribute(control, name))?;
                    if !attr.keyable {
                        return Err(RigError::NotKeyable {
                            control: control.to_string(),
                            attribute: name.to_string(),
                        });
                    }
                    vec![(name.to_string(), attr.value)]
                }
                None => ctrl
                    .attributes
                    .iter()
                    .filter(|(_, a)| a.keyable)
                    .map(|(n, a)| (n.clone(), a.value))
                    .collect(),
            }
        };
        for (name, value) in targets {
            self.record_key(control, &name, value);
        }
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn set_current_time(&mut self, time: f64) {
        self.time = time;
    }

    fn world_position(&self, control: &str) -> RigResult<[f64; 3]> {
        let ctrl = self.control(control)?;
        let mut position = ctrl.parent_origin;
        for (axis, name) in ["tx", "ty", "tz"].iter().enumerate() {
            if let Some(attribute) = ctrl.attributes.get(*name) {
                position[axis] += attribute.value;
            }
        }
        Ok(position)
    }

    fn set_world_position(&mut self, control: &str, position: [f64; 3]) -> RigResult<()> {
        let origin = self.control(control)?.parent_origin;
        for (axis, name) in ["tx", "ty", "tz"].iter().enumerate() {
            self.set_attr(control, name, position[axis] - origin[axis])?;
        }
        Ok(())
    }

    fn list_nodes(&self) -> Vec<String> {
        self.controls
            .keys()
            .chain(self.nodes.iter())
            .chain(self.meshes.keys())
            .chain(self.materials.keys())
            .cloned()
            .collect()
    }

    fn module_descriptors(&self) -> Vec<String> {
        self.module_descriptors.clone()
    }

    fn skinned_meshes(&self) -> Vec<String> {
        self.meshes
            .iter()
            .filter(|(_, m)| m.skinned)
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn duplicate_mesh(&mut self, mesh: &str) -> RigResult<String> {
        let mut copy = self.mesh(mesh)?.clone();
        copy.skinned = false;
        copy.material = None;
        let name = self.unique_name(&format!("{}_dup", mesh));
        self.meshes.insert(name.clone(), copy);
        Ok(name)
    }

    fn freeze_transform(&mut self, node: &str) -> RigResult<()> {
        let mesh = self.mesh_mut(node)?;
        mesh.locked = false;
        mesh.parent = None;
        mesh.translation = [0.0; 3];
        mesh.rotation = [0.0; 3];
        mesh.scale = unit_scale();
        Ok(())
    }

    fn unite_meshes(&mut self, meshes: &[String], name: &str) -> RigResult<String> {
        for mesh in meshes {
            self.mesh(mesh)?;
        }
        for mesh in meshes {
            self.meshes.shift_remove(mesh);
        }
        let name = self.unique_name(name);
        self.meshes.insert(name.clone(), MeshNode::default());
        Ok(name)
    }

    fn rename_node(&mut self, node: &str, name: &str) -> RigResult<String> {
        let mesh = self
            .meshes
            .shift_remove(node)
            .ok_or_else(|| RigError::MissingNode(node.to_string()))?;
        let name = self.unique_name(name);
        self.meshes.insert(name.clone(), mesh);
        Ok(name)
    }

    fn create_material(
        &mut self,
        name: &str,
        color: [f64; 3],
        incandescence: [f64; 3],
    ) -> RigResult<String> {
        let name = self.unique_name(name);
        self.materials.insert(
            name.clone(),
            Material {
                color,
                incandescence,
            },
        );
        Ok(name)
    }

    fn assign_material(&mut self, node: &str, material: &str) -> RigResult<()> {
        if !self.materials.contains_key(material) {
            return Err(RigError::MissingNode(material.to_string()));
        }
        self.mesh_mut(node)?.material = Some(material.to_string());
        Ok(())
    }

    fn node_transform(&self, node: &str) -> RigResult<NodeTransform> {
        Ok(self.mesh(node)?.transform())
    }

    fn delete_node(&mut self, node: &str) -> RigResult<()> {
        let removed = self.meshes.shift_remove(node).is_some()
            || self.materials.shift_remove(node).is_some()
            || self.nodes.shift_remove(node);
        if removed {
            Ok(())
        } else {
            Err(RigError::MissingNode(node.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> MemoryRig {
        MemoryRig::new()
            .with_control(
                "hand_l",
                Control::transform()
                    .at([10.0, 0.0, 0.0])
                    .locked_attr("lockedAttr", 3.0),
            )
            .with_skinned_mesh("body_geo", [0.0, 1.0, 0.0])
    }

    #[test]
    fn test_keyable_list_excludes_locked() {
        let rig = rig();
        let attrs = rig.keyable_attributes("hand_l").unwrap();
        assert_eq!(attrs.len(), 9);
        assert!(!attrs.contains(&"lockedAttr".to_string()));
        assert!(!rig.is_keyable("hand_l", "lockedAttr"));
    }

    #[test]
    fn test_locked_write_fails() {
        let mut rig = rig();
        let err = rig.set_attr("hand_l", "lockedAttr", 1.0).unwrap_err();
        assert!(matches!(err, RigError::Locked { .. }));
        assert_eq!(rig.value("hand_l", "lockedAttr"), Some(3.0));
    }

    #[test]
    fn test_world_position_round_trip() {
        let mut rig = rig();
        rig.set_world_position("hand_l", [12.0, 1.0, -1.0]).unwrap();
        assert_eq!(rig.value("hand_l", "tx"), Some(2.0));
        assert_eq!(rig.world_position("hand_l").unwrap(), [12.0, 1.0, -1.0]);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut rig = rig();
        rig.set_attr("hand_l", "rx", 40.0).unwrap();
        rig.set_attr("hand_l", "sx", 2.0).unwrap();
        rig.reset_control("hand_l").unwrap();
        assert_eq!(rig.value("hand_l", "rx"), Some(0.0));
        assert_eq!(rig.value("hand_l", "sx"), Some(1.0));
    }

    #[test]
    fn test_set_key_replaces_same_time() {
        let mut rig = rig();
        rig.set_key("hand_l", Some("rx")).unwrap();
        rig.set_attr("hand_l", "rx", 5.0).unwrap();
        rig.set_key("hand_l", Some("rx")).unwrap();
        let keys: Vec<_> = rig.keys_for("hand_l", "rx").collect();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].value, 5.0);
    }

    #[test]
    fn test_mesh_primitives() {
        let mut rig = rig();
        let dup = rig.duplicate_mesh("body_geo").unwrap();
        rig.freeze_transform(&dup).unwrap();
        let united = rig.unite_meshes(&[dup.clone()], "idle_ghost").unwrap();
        assert_eq!(united, "idle_ghost");
        assert!(!rig.meshes.contains_key(&dup));
        assert_eq!(rig.skinned_meshes(), vec!["body_geo".to_string()]);

        let mat = rig
            .create_material("idle_ghost_material", [0.0, 0.3, 1.0], [0.2; 3])
            .unwrap();
        rig.assign_material(&united, &mat).unwrap();
        rig.delete_node(&united).unwrap();
        rig.delete_node(&mat).unwrap();
        assert!(rig.materials.is_empty());
    }

    #[test]
    fn test_scene_json() {
        let json = r#"{
            "controls": {
                "hip_anim": { "attributes": { "tx": { "value": 1.0 } } }
            },
            "time": 12.0
        }"#;
        let rig = MemoryRig::from_json(json).unwrap();
        assert_eq!(rig.value("hip_anim", "tx"), Some(1.0));
        assert!(rig.is_keyable("hip_anim", "tx"));
        assert_eq!(rig.current_time(), 12.0);
    }
}

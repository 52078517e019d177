//! Ghost overlays: a frozen duplicate of the posed mesh plus per-control
//! reference markers the live rig can be snapped back onto.

use tracing::{debug, info, warn};

use crate::apply::{key_registered, PoseApplier};
use crate::error::{PoseError, PoseResult, RigResult};
use crate::host::{Channel, LimbMatcher, NodeTransform, Progress, RigHost};
use crate::mirror::MirrorEngine;
use crate::snapshot::Snapshot;

/// Appearance and naming of ghost meshes.
#[derive(Debug, Clone, PartialEq)]
pub struct GhostStyle {
    /// Appended to the pose name to form the mesh name.
    pub mesh_suffix: String,
    /// Appended to the mesh name to form the material name.
    pub material_suffix: String,
    pub color: [f64; 3],
    pub incandescence: [f64; 3],
}

impl Default for GhostStyle {
    fn default() -> Self {
        Self {
            mesh_suffix: "_ghost".to_string(),
            material_suffix: "_material".to_string(),
            color: [0.0, 0.327258, 1.0],
            incandescence: [0.266011; 3],
        }
    }
}

impl GhostStyle {
    pub fn with_color(mut self, color: [f64; 3]) -> Self {
        self.color = color;
        self
    }

    pub fn with_incandescence(mut self, incandescence: [f64; 3]) -> Self {
        self.incandescence = incandescence;
        self
    }
}

/// Which pose the ghost shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GhostVariant {
    /// The pose as stored.
    #[default]
    Exact,
    /// The mirrored pose.
    Mirrored,
}

/// Reference state of one control, rigidly attached to the ghost mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct GhostMarker {
    pub control: String,
    /// Position in the ghost mesh's space at build time.
    pub offset: [f64; 3],
    pub rotation: [Option<f64>; 3],
    pub translation: Option<[f64; 3]>,
}

/// A live ghost in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Ghost {
    pub mesh: String,
    pub material: String,
    pub variant: GhostVariant,
    pub markers: Vec<GhostMarker>,
}

/// Summary of a snap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapReport {
    pub snapped: usize,
    pub repositioned: usize,
    pub keyed: usize,
    pub failures: Vec<(String, String)>,
}

/// Builds, snaps and discards ghosts.
pub struct GhostOverlay<'a> {
    applier: &'a PoseApplier<'a>,
    mirror: &'a MirrorEngine,
    style: GhostStyle,
}

impl<'a> GhostOverlay<'a> {
    pub fn new(applier: &'a PoseApplier<'a>, mirror: &'a MirrorEngine) -> Self {
        Self {
            applier,
            mirror,
            style: GhostStyle::default(),
        }
    }

    pub fn with_style(mut self, style: GhostStyle) -> Self {
        self.style = style;
        self
    }

    /// Applies the pose and builds a ghost of the result.
    ///
    /// Fails with [`PoseError::NoSkinnedGeometry`] before touching the rig if
    /// there is nothing to duplicate.
    pub fn build(
        &self,
        rig: &mut dyn RigHost,
        name: &str,
        snapshots: &[Snapshot],
        variant: GhostVariant,
        matcher: &mut dyn LimbMatcher,
        progress: &mut dyn Progress,
    ) -> PoseResult<Ghost> {
        let sources = rig.skinned_meshes();
        if sources.is_empty() {
            return Err(PoseError::NoSkinnedGeometry);
        }

        match variant {
            GhostVariant::Exact => {
                self.applier.apply_exact(rig, snapshots, matcher);
            }
            GhostVariant::Mirrored => {
                self.mirror
                    .mirror_pose(rig, self.applier, snapshots, matcher, progress);
            }
        }

        let mesh = self.build_mesh(rig, name, &sources)?;
        let material = match self.build_material(rig, &mesh) {
            Ok(material) => material,
            Err(e) => {
                let _ = rig.delete_node(&mesh);
                return Err(e.into());
            }
        };
        let frame = rig.node_transform(&mesh)?;

        let markers = self.capture_markers(rig, &frame);
        info!(mesh = %mesh, markers = markers.len(), "Built ghost");
        Ok(Ghost {
            mesh,
            material,
            variant,
            markers,
        })
    }

    fn build_mesh(
        &self,
        rig: &mut dyn RigHost,
        name: &str,
        sources: &[String],
    ) -> RigResult<String> {
        let mut pieces = Vec::new();
        let result = (|| -> RigResult<String> {
            for source in sources {
                let piece = rig.duplicate_mesh(source)?;
                pieces.push(piece.clone());
                rig.freeze_transform(&piece)?;
            }
            let target = format!("{}{}", name, self.style.mesh_suffix);
            match pieces.as_slice() {
                [single] => rig.rename_node(single, &target),
                _ => rig.unite_meshes(&pieces, &target),
            }
        })();

        if result.is_err() {
            for piece in &pieces {
                let _ = rig.delete_node(piece);
            }
        }
        result
    }

    fn build_material(&self, rig: &mut dyn RigHost, mesh: &str) -> RigResult<String> {
        let material = rig.create_material(
            &format!("{}{}", mesh, self.style.material_suffix),
            self.style.color,
            self.style.incandescence,
        )?;
        if let Err(e) = rig.assign_material(mesh, &material) {
            let _ = rig.delete_node(&material);
            return Err(e);
        }
        Ok(material)
    }

    fn capture_markers(&self, rig: &dyn RigHost, frame: &NodeTransform) -> Vec<GhostMarker> {
        let mut markers = Vec::new();
        for control in self.applier.registry().controls() {
            if control.contains("space_switcher") || !rig.control_exists(control) {
                continue;
            }
            let Ok(world) = rig.world_position(control) else {
                continue;
            };
            let read = |c: Channel| rig.get_attr(control, c.attribute()).ok();
            let translation = match (read(Channel::Tx), read(Channel::Ty), read(Channel::Tz)) {
                (Some(x), Some(y), Some(z)) => Some([x, y, z]),
                _ => None,
            };
            markers.push(GhostMarker {
                control: control.to_string(),
                offset: frame.inverse_transform_point(world),
                rotation: [read(Channel::Rx), read(Channel::Ry), read(Channel::Rz)],
                translation,
            });
        }
        markers
    }

    /// Snaps the live rig onto the ghost's markers, keys everything and
    /// discards the ghost.
    ///
    /// Markers follow the ghost mesh rigidly: their positions are carried
    /// through the mesh's current translation, rotation and scale.
    ///
    /// Controls are repositioned and their translate channels keyed only if
    /// all three translate channels are keyable; rotation is copied onto
    /// whichever rotate channels are. Control-vertex controls of custom
    /// modules are not snapped.
    pub fn snap(
        &self,
        rig: &mut dyn RigHost,
        ghost: Ghost,
        progress: &mut dyn Progress,
    ) -> PoseResult<SnapReport> {
        let frame = rig.node_transform(&ghost.mesh)?;
        let registry = self.applier.registry();
        let mut report = SnapReport::default();

        progress.begin("Snapping to ghost", ghost.markers.len());
        for marker in &ghost.markers {
            progress.step();
            let control = marker.control.as_str();
            if registry.is_custom_module(control) && control.contains("_cv_") {
                continue;
            }
            if !rig.control_exists(control) {
                continue;
            }

            let positional = Channel::TRANSLATE
                .iter()
                .all(|c| rig.is_keyable(control, c.attribute()));
            if positional {
                let target = frame.transform_point(marker.offset);
                let placed = rig.set_world_position(control, target).and_then(|()| {
                    Channel::TRANSLATE
                        .iter()
                        .try_for_each(|c| rig.set_key(control, Some(c.attribute())))
                });
                match placed {
                    Ok(()) => report.repositioned += 1,
                    Err(e) => report.failures.push((control.to_string(), e.to_string())),
                }
            }

            for (channel, value) in Channel::ROTATE.iter().zip(marker.rotation) {
                let Some(value) = value else { continue };
                if !rig.is_keyable(control, channel.attribute()) {
                    continue;
                }
                if let Err(e) = rig.set_attr(control, channel.attribute(), value) {
                    report.failures.push((control.to_string(), e.to_string()));
                }
            }
            report.snapped += 1;
        }
        progress.finish();

        report.keyed = key_registered(rig, registry);
        self.discard(rig, ghost)?;
        debug!(
            snapped = report.snapped,
            failures = report.failures.len(),
            "Snapped to ghost"
        );
        Ok(report)
    }

    /// Removes the ghost mesh and material without touching the rig.
    pub fn discard(&self, rig: &mut dyn RigHost, ghost: Ghost) -> PoseResult<()> {
        let mesh = rig.delete_node(&ghost.mesh);
        let material = rig.delete_node(&ghost.material);
        if let Err(e) = &material {
            warn!(material = %ghost.material, error = %e, "Ghost material already gone");
        }
        mesh?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RigResult;
    use crate::host::{MatchRequest, NoProgress};
    use crate::memory_rig::{Control, MemoryRig};
    use crate::registry::ControlRegistry;

    struct NoMatch;

    impl LimbMatcher for NoMatch {
        fn match_limb(&mut self, _rig: &mut dyn RigHost, _request: MatchRequest) -> RigResult<()> {
            Ok(())
        }
    }

    fn rig() -> MemoryRig {
        MemoryRig::new()
            .with_control("hip_anim", Control::transform().at([0.0, 10.0, 0.0]))
            .with_control("fk_arm_l_anim", Control::rotation().at([4.0, 15.0, 0.0]))
            .with_skinned_mesh("body_geo", [0.0, 0.0, 0.0])
            .with_skinned_mesh("head_geo", [0.0, 1.0, 0.0])
    }

    fn registry() -> ControlRegistry {
        ControlRegistry::from_controls(["hip_anim", "fk_arm_l_anim"])
    }

    fn pose() -> Vec<Snapshot> {
        vec![
            Snapshot::new("hip_anim").with("tx", 2.0).with("ry", 15.0),
            Snapshot::new("fk_arm_l_anim").with("rz", 40.0),
        ]
    }

    #[test]
    fn test_build_unites_and_styles() {
        let mut rig = rig();
        let registry = registry();
        let applier = PoseApplier::new(&registry);
        let engine = MirrorEngine::default();
        let overlay = GhostOverlay::new(&applier, &engine);

        let ghost = overlay
            .build(&mut rig, "wave", &pose(), GhostVariant::Exact, &mut NoMatch, &mut NoProgress)
            .unwrap();

        assert_eq!(ghost.mesh, "wave_ghost");
        assert_eq!(ghost.material, "wave_ghost_material");
        assert_eq!(rig.meshes.len(), 3);
        assert_eq!(rig.meshes["wave_ghost"].material.as_deref(), Some("wave_ghost_material"));
        assert_eq!(rig.materials["wave_ghost_material"].color, [0.0, 0.327258, 1.0]);
        assert_eq!(ghost.markers.len(), 2);
        assert_eq!(ghost.markers[0].offset, [2.0, 10.0, 0.0]);
    }

    #[test]
    fn test_snap_restores_pose_and_cleans_up() {
        let mut rig = rig();
        let registry = registry();
        let applier = PoseApplier::new(&registry);
        let engine = MirrorEngine::default();
        let overlay = GhostOverlay::new(&applier, &engine);

        let ghost = overlay
            .build(&mut rig, "wave", &pose(), GhostVariant::Exact, &mut NoMatch, &mut NoProgress)
            .unwrap();
        // The animator moves the ghost and changes the rig.
        rig.meshes.get_mut("wave_ghost").unwrap().translation = [1.0, 0.0, 0.0];
        rig.reset_control("hip_anim").unwrap();
        rig.reset_control("fk_arm_l_anim").unwrap();

        let report = overlay.snap(&mut rig, ghost, &mut NoProgress).unwrap();

        assert_eq!(rig.value("hip_anim", "tx"), Some(3.0));
        assert_eq!(rig.value("hip_anim", "ry"), Some(15.0));
        assert_eq!(rig.value("fk_arm_l_anim", "rz"), Some(40.0));
        assert_eq!(report.repositioned, 1);
        assert_eq!(report.snapped, 2);
        assert_eq!(report.keyed, 2);
        assert!(!rig.meshes.contains_key("wave_ghost"));
        assert!(rig.materials.is_empty());
    }

    #[test]
    fn test_snap_keys_translation_per_marker() {
        let mut rig = rig();
        let registry = ControlRegistry::from_controls(["fk_arm_l_anim", "hip_anim"]);
        let applier = PoseApplier::new(&registry);
        let engine = MirrorEngine::default();
        let overlay = GhostOverlay::new(&applier, &engine);

        let ghost = overlay
            .build(&mut rig, "wave", &pose(), GhostVariant::Exact, &mut NoMatch, &mut NoProgress)
            .unwrap();
        rig.keys.clear();

        overlay.snap(&mut rig, ghost, &mut NoProgress).unwrap();

        // Translate keys land while the marker is processed, before the
        // closing pass keys the arm.
        let first: Vec<(&str, &str)> = rig.keys[..3]
            .iter()
            .map(|k| (k.control.as_str(), k.attribute.as_str()))
            .collect();
        assert_eq!(
            first,
            [("hip_anim", "tx"), ("hip_anim", "ty"), ("hip_anim", "tz")]
        );
        assert_eq!(rig.keys[0].value, 2.0);
    }

    #[test]
    fn test_no_geometry() {
        let mut rig = MemoryRig::new().with_control("hip_anim", Control::transform().set("tx", 1.0));
        let registry = registry();
        let applier = PoseApplier::new(&registry);
        let engine = MirrorEngine::default();
        let overlay = GhostOverlay::new(&applier, &engine);

        let err = overlay
            .build(&mut rig, "wave", &pose(), GhostVariant::Exact, &mut NoMatch, &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, PoseError::NoSkinnedGeometry));
        assert_eq!(rig.value("hip_anim", "tx"), Some(1.0));
    }
}

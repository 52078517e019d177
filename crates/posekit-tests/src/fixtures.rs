//! Rig fixtures shared by the end-to-end tests.

use posekit_core::{Control, MemoryRig, Snapshot, RIG_SETTINGS};

/// A small biped with paired arms and legs, a spine, one space switcher and
/// two skinned meshes.
///
/// Controls sit at mirror-symmetric world origins and every limb starts in
/// FK mode.
pub fn standard_rig() -> MemoryRig {
    let ik_wrist = || {
        Control::transform()
            .attr("mid_bend", 0.0)
            .attr("mid_swivel", 0.0)
            .attr("tip_pivot", 0.0)
            .attr("tip_swivel", 0.0)
    };

    MemoryRig::new()
        .with_control(
            RIG_SETTINGS,
            Control::new()
                .attr("spine_ik", 0.0)
                .attr_with_default("spine_fk", 1.0, 1.0)
                .attr("lArmMode", 0.0)
                .attr("rArmMode", 0.0)
                .attr("lLegMode", 0.0)
                .attr("rLegMode", 0.0)
                .attr("lFkArmOrient", 0.0)
                .attr("rFkArmOrient", 0.0),
        )
        .with_control("hip_anim", Control::transform().at([0.0, 10.0, 0.0]))
        .with_control("body_anim", Control::transform().at([0.0, 11.0, 0.0]))
        .with_control("spine_01_anim", Control::rotation().at([0.0, 12.0, 0.0]))
        .with_control("mid_ik_anim", Control::transform().at([0.0, 13.0, 0.0]))
        .with_control("head_fk_anim", Control::rotation().at([0.0, 16.0, 0.0]))
        .with_control("clavicle_l_anim", Control::transform().at([1.0, 15.0, 0.0]))
        .with_control("clavicle_r_anim", Control::transform().at([-1.0, 15.0, 0.0]))
        .with_control("fk_arm_l_anim", Control::rotation().at([2.0, 15.0, 0.0]))
        .with_control("fk_arm_r_anim", Control::rotation().at([-2.0, 15.0, 0.0]))
        .with_control("fk_wrist_l_anim", Control::rotation().at([6.0, 15.0, 0.0]))
        .with_control("fk_wrist_r_anim", Control::rotation().at([-6.0, 15.0, 0.0]))
        .with_control("ik_wrist_l_anim", ik_wrist().at([6.0, 15.0, 0.0]))
        .with_control("ik_wrist_r_anim", ik_wrist().at([-6.0, 15.0, 0.0]))
        .with_control(
            "ik_foot_anim_l",
            Control::transform().attr("knee_twist", 0.0).at([1.0, 0.0, 0.0]),
        )
        .with_control(
            "ik_foot_anim_r",
            Control::transform().attr("knee_twist", 0.0).at([-1.0, 0.0, 0.0]),
        )
        .with_control(
            "ik_wrist_l_anim_space_switcher",
            Control::new()
                .attr("space_world", 0.0)
                .attr("space_chest_ik_anim", 0.0)
                .attr("space_hip_anim", 0.0),
        )
        .with_node("ik_wrist_l_anim_space_switcher_follow")
        .with_skinned_mesh("body_geo", [0.0, 0.0, 0.0])
        .with_skinned_mesh("head_geo", [0.0, 1.0, 0.0])
}

/// [`standard_rig`] as scene JSON.
pub fn standard_scene_json() -> String {
    standard_rig()
        .to_json_pretty()
        .expect("Failed to serialize rig")
}

/// A left-arm reaching pose with the hips shifted.
pub fn arm_pose() -> Vec<Snapshot> {
    vec![
        Snapshot::new("hip_anim")
            .with("tx", 0.5)
            .with("ty", -1.0)
            .with("ry", 10.0),
        Snapshot::new("fk_arm_l_anim")
            .with("rx", 5.0)
            .with("ry", -20.0)
            .with("rz", 35.0),
        Snapshot::new("fk_wrist_l_anim")
            .with("rx", 0.0)
            .with("ry", 45.0)
            .with("rz", 0.0),
        Snapshot::new("ik_wrist_l_anim")
            .with("tx", 1.0)
            .with("ty", 2.0)
            .with("tz", 0.5)
            .with("ry", 30.0)
            .with("mid_bend", 4.0),
    ]
}

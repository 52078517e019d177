//! Property-based tests for left/right name mirroring using proptest.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p posekit-tests --test proptest_naming
//! ```

use proptest::prelude::*;

use posekit_core::mirror::side_of;
use posekit_core::{is_central, mirror_name, Side, FIXED_CONTROLS};

// ============================================================================
// Strategies
// ============================================================================

/// Control-like names built from side tokens and plain segments.
fn control_name() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("l".to_string()),
            Just("r".to_string()),
            "[a-z]{1,6}",
            "[0-9]{1,2}",
        ],
        1..6,
    )
    .prop_map(|segments| segments.join("_"))
}

/// Arbitrary names, including ones with stray underscores.
fn arbitrary_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9_:]{0,40}").unwrap()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Mirroring twice yields the original name.
    #[test]
    fn mirror_name_is_an_involution(name in control_name()) {
        prop_assert_eq!(mirror_name(&mirror_name(&name)), name);
    }

    /// The involution holds for arbitrary strings too.
    #[test]
    fn mirror_name_is_an_involution_for_any_string(name in arbitrary_name()) {
        prop_assert_eq!(mirror_name(&mirror_name(&name)), name);
    }

    /// Central names map to themselves; sided names map to the other side.
    #[test]
    fn mirror_name_flips_side(name in control_name()) {
        let mirrored = mirror_name(&name);
        match side_of(&name) {
            None => {
                prop_assert!(is_central(&name));
                prop_assert_eq!(&mirrored, &name);
            }
            Some(side) => {
                prop_assert_ne!(&mirrored, &name);
                prop_assert_eq!(side_of(&mirrored), Some(side.opposite()));
            }
        }
        prop_assert_eq!(mirrored.len(), name.len());
    }
}

#[test]
fn test_fixed_controls_mirror_within_the_set() {
    for control in FIXED_CONTROLS {
        let mirrored = mirror_name(control);
        assert!(
            FIXED_CONTROLS.contains(&mirrored.as_str()),
            "{} mirrors to {}, which is not a fixed control",
            control,
            mirrored
        );
    }
}

#[test]
fn test_known_pairs() {
    assert_eq!(mirror_name("fk_wrist_l_anim"), "fk_wrist_r_anim");
    assert_eq!(mirror_name("ik_foot_anim_r"), "ik_foot_anim_l");
    assert_eq!(mirror_name("index_l_poleVector"), "index_r_poleVector");
    assert_eq!(mirror_name("hip_anim"), "hip_anim");
    assert_eq!(mirror_name("l_global_ik_anim"), "l_global_ik_anim");
    assert_eq!(side_of("thumb_finger_fk_ctrl_1_l"), Some(Side::Left));
}

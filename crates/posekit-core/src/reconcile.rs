//! Restoring per-limb FK/IK authoring modes after an Exact apply.

use tracing::{debug, info, warn};

use crate::host::{LimbMatcher, MatchRequest, RigHost};
use crate::mode::{IkFkMode, Limb, RigModeState};

/// What happened to one limb during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimbOutcome {
    /// Recorded and live modes already agree. Nothing was called or keyed.
    Unchanged,
    /// The limb was matched into the recorded mode and its toggle keyed.
    Matched { from: IkFkMode, to: IkFkMode },
    /// The match operation failed; the toggle was left alone.
    MatchFailed(String),
    /// The live mode could not be read or written.
    Failed(String),
}

/// Reconciliation result per limb, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub limbs: Vec<(Limb, LimbOutcome)>,
}

impl ReconcileReport {
    /// Limbs that were converted.
    pub fn matched(&self) -> impl Iterator<Item = Limb> + '_ {
        self.limbs
            .iter()
            .filter(|(_, o)| matches!(o, LimbOutcome::Matched { .. }))
            .map(|(l, _)| *l)
    }

    /// Returns true if every limb was already in its recorded mode.
    pub fn is_noop(&self) -> bool {
        self.limbs
            .iter()
            .all(|(_, o)| matches!(o, LimbOutcome::Unchanged))
    }

    /// Outcome for one limb.
    pub fn outcome(&self, limb: Limb) -> Option<&LimbOutcome> {
        self.limbs.iter().find(|(l, _)| *l == limb).map(|(_, o)| o)
    }
}

/// Normalizes limb modes back to a recorded state.
pub struct ModeReconciler;

impl ModeReconciler {
    /// Brings every limb back to its `recorded` mode.
    ///
    /// Limbs are processed in [`Limb::ALL`] order. For each mismatch the
    /// matcher converts the current pose into the recorded representation
    /// first, then the toggle is flipped and keyed, so the visible pose is
    /// unchanged. The timeline is refreshed once before and once after.
    pub fn reconcile(
        rig: &mut dyn RigHost,
        recorded: &RigModeState,
        matcher: &mut dyn LimbMatcher,
    ) -> ReconcileReport {
        rig.refresh_timeline();

        let mut report = ReconcileReport::default();
        for limb in Limb::ALL {
            let outcome = Self::reconcile_limb(rig, limb, recorded.get(limb), matcher);
            report.limbs.push((limb, outcome));
        }

        rig.refresh_timeline();

        let matched = report.matched().count();
        if matched > 0 {
            info!(matched, "Restored limb modes");
        }
        report
    }

    fn reconcile_limb(
        rig: &mut dyn RigHost,
        limb: Limb,
        recorded: IkFkMode,
        matcher: &mut dyn LimbMatcher,
    ) -> LimbOutcome {
        let live = match limb.read(rig) {
            Ok(mode) => mode,
            Err(e) => return LimbOutcome::Failed(e.to_string()),
        };
        if live == recorded {
            return LimbOutcome::Unchanged;
        }

        debug!(limb = %limb, from = %live, to = %recorded, "Matching limb");
        let request = MatchRequest {
            limb,
            from: live,
            to: recorded,
        };
        if let Err(e) = matcher.match_limb(rig, request) {
            warn!(limb = %limb, error = %e, "Limb match failed, mode left unchanged");
            return LimbOutcome::MatchFailed(e.to_string());
        }

        match limb.write(rig, recorded).and_then(|()| limb.key(rig)) {
            Ok(()) => LimbOutcome::Matched {
                from: live,
                to: recorded,
            },
            Err(e) => LimbOutcome::Failed(e.to_string()),
        }
    }
}

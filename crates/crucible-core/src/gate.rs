//! The triage gate: factor scores in, tier decision out.
//!
//! `decide` is pure given its inputs — identical factor scores, snapshot,
//! and mode always produce the same total and tier, which is what makes
//! the gate testable and lets calibration re-derive what today's weights
//! would have decided for yesterday's requests.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::calibration::CalibrationState;
use crate::domain::{FactorScores, Tier, TriageDecision};
use crate::mode::{Mode, ModeController};

/// The shifted full/deep cut point never drops below t2 plus this gap,
/// so the four tiers stay non-overlapping under any mode.
const MIN_T3_GAP: f64 = 0.5;

/// Locate the tier for a rounded total score.
///
/// Thresholds partition the score range into exactly four tiers:
/// `< t1` skip, `< t2` light, `< t3` full, the rest deep. The mode's
/// tier-threshold shift moves t3 (aggressive raises it, permissive
/// lowers it); [`Mode::Raw`] forces skip outright.
pub fn locate_tier(total: f64, state: &CalibrationState, mode: Mode) -> Tier {
    if mode == Mode::Raw {
        return Tier::Skip;
    }

    let [t1, t2, t3] = state.thresholds;
    let shift = ModeController::parameters(mode).tier_threshold_shift;
    let t3 = (t3 + shift).max(t2 + MIN_T3_GAP);

    if total < t1 {
        Tier::Skip
    } else if total < t2 {
        Tier::Light
    } else if total < t3 {
        Tier::Full
    } else {
        Tier::Deep
    }
}

/// Combine factor scores into a [`TriageDecision`] under the given
/// calibration snapshot and mode.
pub fn decide(
    request_id: Uuid,
    factors: FactorScores,
    state: &CalibrationState,
    mode: Mode,
) -> TriageDecision {
    let total = factors.weighted_total(&state.weights).round();
    let tier = locate_tier(total, state, mode);

    debug!(
        %request_id,
        total_score = total,
        tier = %tier,
        weights_version = state.version,
        mode = %mode,
        "triage decided"
    );

    TriageDecision {
        id: Uuid::new_v4(),
        request_id,
        factors,
        total_score: total,
        tier,
        weights_version: state.version,
        decided_at: Utc::now(),
    }
}

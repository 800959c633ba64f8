//! Periodic, bounded recalibration of triage weights and thresholds.
//!
//! The calibrator only ever adjusts numeric parameters — a ±0.05 weight
//! step and a ±0.5 threshold shift per pass, both validated before the
//! swap — never its own algorithm. That keeps the feedback loop
//! analyzable: the worst a bad window can do is nudge a number, and an
//! invalid proposal is rejected outright.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::calibration::{CalibrationState, CalibrationStore};
use crate::config::CrucibleConfig;
use crate::domain::{Factor, OutcomeRecord, OutcomeSignal};
use crate::outcome_tracker::{accuracy_of, OutcomeTracker};

/// Recomputes the calibration state from outcome history.
pub struct Calibrator {
    store: Arc<CalibrationStore>,
    window: usize,
    accuracy_target: f64,
    weight_step: f64,
    threshold_step: f64,
    /// Serializes calibration passes; at most one runs at a time.
    pass_lock: Mutex<()>,
}

impl Calibrator {
    pub fn new(store: Arc<CalibrationStore>, config: &CrucibleConfig) -> Self {
        Self {
            store,
            window: config.calibration_window,
            accuracy_target: config.accuracy_target,
            weight_step: config.weight_step,
            threshold_step: config.threshold_step,
            pass_lock: Mutex::new(()),
        }
    }

    /// Run a calibration pass if a full window of new outcomes has
    /// accumulated. Returns the new state when one was swapped in.
    ///
    /// The window counter resets whether or not parameters moved, so at
    /// most one pass runs per window and the loop cannot oscillate on
    /// one bad batch.
    pub fn maybe_calibrate(&self, tracker: &OutcomeTracker) -> Option<Arc<CalibrationState>> {
        let _guard = self.pass_lock.lock().expect("calibration pass lock poisoned");

        if tracker.samples_since_calibration() < self.window {
            return None;
        }

        let records = tracker.recent(self.window);
        tracker.reset_calibration_counter();

        let accuracy = accuracy_of(&records);
        if accuracy >= self.accuracy_target {
            debug!(accuracy, target = self.accuracy_target, "accuracy on target, no calibration");
            return None;
        }

        let current = self.store.snapshot();
        let proposal = self.propose(&current, &records, accuracy);

        match self.store.swap(proposal) {
            Ok(next) => {
                info!(
                    accuracy,
                    version = next.version,
                    thresholds = ?next.thresholds,
                    "calibration applied"
                );
                Some(next)
            }
            Err(e) => {
                warn!(error = %e, "calibration proposal rejected, prior state retained");
                None
            }
        }
    }

    /// Build the adjusted state: correlate each factor's contribution
    /// with the misclassification direction, nudge weights one bounded
    /// step, and shift the threshold nearest the misclassified scores
    /// toward the majority fix.
    fn propose(
        &self,
        current: &CalibrationState,
        records: &[OutcomeRecord],
        accuracy: f64,
    ) -> CalibrationState {
        let misclassified: Vec<&OutcomeRecord> = records
            .iter()
            .filter(|r| r.signal.is_misclassification())
            .collect();

        let mut next = current.clone();
        next.version = current.version + 1;
        next.last_calibrated_at = Some(Utc::now());

        if misclassified.is_empty() {
            // Sub-target accuracy with no misclassified sample to learn
            // from (all evidence aged out of the window): nothing to do.
            debug!(accuracy, "no misclassified samples in window");
            return next;
        }

        // Over-applied decisions pull the factors that drove them down;
        // under-applied decisions pull them up.
        let (lo, hi) = CrucibleConfig::WEIGHT_RANGE;
        for factor in Factor::ALL {
            let mut pressure = 0i64;
            for record in &misclassified {
                let points = i64::from(record.decision.factors.get(factor).points());
                match record.signal {
                    OutcomeSignal::OverApplied => pressure -= points,
                    OutcomeSignal::UnderApplied => pressure += points,
                    _ => {}
                }
            }
            if pressure != 0 {
                let step = if pressure > 0 { self.weight_step } else { -self.weight_step };
                let adjusted = (current.weight(factor) + step).clamp(lo, hi);
                next.weights.insert(factor, adjusted);
            }
        }

        let over = misclassified
            .iter()
            .filter(|r| r.signal == OutcomeSignal::OverApplied)
            .count();
        let under = misclassified.len() - over;

        if over != under {
            let mean_total = misclassified.iter().map(|r| r.decision.total_score).sum::<f64>()
                / misclassified.len() as f64;
            let nearest = nearest_threshold(&current.thresholds, mean_total);
            // Raising the nearest cut point pushes borderline scores down
            // a tier (fixes over-application); lowering pulls them up.
            let shift = if over > under { self.threshold_step } else { -self.threshold_step };
            next.thresholds[nearest] += shift;
        }

        next
    }
}

fn nearest_threshold(thresholds: &[f64; 3], score: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::MAX;
    for (i, t) in thresholds.iter().enumerate() {
        let distance = (t - score).abs();
        if distance < best_distance {
            best = i;
            best_distance = distance;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FactorLevel, FactorScores, Tier, TriageDecision};
    use uuid::Uuid;

    fn small_config() -> CrucibleConfig {
        CrucibleConfig {
            calibration_window: 10,
            ..Default::default()
        }
    }

    fn setup(config: &CrucibleConfig) -> (Arc<CalibrationStore>, Calibrator, OutcomeTracker) {
        let store = Arc::new(CalibrationStore::new(CalibrationState::initial(config)).unwrap());
        let calibrator = Calibrator::new(Arc::clone(&store), config);
        (store, calibrator, OutcomeTracker::new())
    }

    fn decision(total: f64, tier: Tier, stakes: FactorLevel) -> TriageDecision {
        let mut factors = FactorScores::default();
        factors.stakes = stakes;
        TriageDecision {
            id: Uuid::new_v4(),
            request_id: Uuid::new_v4(),
            factors,
            total_score: total,
            tier,
            weights_version: 1,
            decided_at: Utc::now(),
        }
    }

    #[test]
    fn test_no_pass_before_window_fills() {
        let config = small_config();
        let (_, calibrator, tracker) = setup(&config);
        for _ in 0..9 {
            tracker.record(
                decision(8.0, Tier::Deep, FactorLevel::Strong),
                OutcomeSignal::OverApplied,
            );
        }
        assert!(calibrator.maybe_calibrate(&tracker).is_none());
    }

    #[test]
    fn test_accurate_window_is_a_noop() {
        let config = small_config();
        let (store, calibrator, tracker) = setup(&config);
        for _ in 0..10 {
            tracker.record(
                decision(6.0, Tier::Full, FactorLevel::Weak),
                OutcomeSignal::Correct,
            );
        }
        assert!(calibrator.maybe_calibrate(&tracker).is_none());
        assert_eq!(store.snapshot().version, 1);
        // Counter resets even on a no-op pass.
        assert_eq!(tracker.samples_since_calibration(), 0);
    }

    #[test]
    fn test_inaccurate_window_swaps_new_state() {
        let config = small_config();
        let (store, calibrator, tracker) = setup(&config);
        let before = store.snapshot();

        // 6 correct, 4 over-applied driven by strong stakes: accuracy 0.6.
        for _ in 0..6 {
            tracker.record(
                decision(3.0, Tier::Light, FactorLevel::None),
                OutcomeSignal::Correct,
            );
        }
        for _ in 0..4 {
            tracker.record(
                decision(8.0, Tier::Deep, FactorLevel::Strong),
                OutcomeSignal::OverApplied,
            );
        }

        let next = calibrator.maybe_calibrate(&tracker).expect("calibration applied");
        assert_eq!(next.version, 2);
        assert!(next.last_calibrated_at.is_some());
        // Stakes drove the over-application, so its weight dropped.
        assert!(next.weight(Factor::Stakes) < before.weight(Factor::Stakes));
        // Over-applied majority raises the nearest (full/deep) cut point.
        assert!(next.thresholds[2] > before.thresholds[2]);
        // Prior snapshot is untouched.
        assert_eq!(before.version, 1);
    }

    #[test]
    fn test_under_applied_majority_lowers_threshold() {
        let config = small_config();
        let (_store, calibrator, tracker) = setup(&config);
        for _ in 0..4 {
            tracker.record(
                decision(5.0, Tier::Light, FactorLevel::Weak),
                OutcomeSignal::Correct,
            );
        }
        for _ in 0..6 {
            // Skipped at total 2 but the caller pushed back.
            tracker.record(
                decision(2.0, Tier::Skip, FactorLevel::Weak),
                OutcomeSignal::UnderApplied,
            );
        }

        let next = calibrator.maybe_calibrate(&tracker).expect("calibration applied");
        // Nearest threshold to mean total 2.0 is t1; it drops.
        assert!(next.thresholds[0] < config.initial_thresholds[0]);
        // Upward pressure on stakes is clamped at the ceiling.
        assert!((next.weight(Factor::Stakes) - 1.0).abs() < f64::EPSILON);
        for factor in Factor::ALL {
            let w = next.weight(factor);
            assert!((0.1..=1.0).contains(&w));
        }
    }

    #[test]
    fn test_weights_never_leave_valid_range() {
        let config = CrucibleConfig {
            calibration_window: 4,
            ..Default::default()
        };
        let (store, calibrator, tracker) = setup(&config);

        // Drive repeated downward pressure on stakes far past the floor.
        for _ in 0..30 {
            for _ in 0..4 {
                tracker.record(
                    decision(8.0, Tier::Deep, FactorLevel::Strong),
                    OutcomeSignal::OverApplied,
                );
            }
            calibrator.maybe_calibrate(&tracker);
        }

        let state = store.snapshot();
        for factor in Factor::ALL {
            let w = state.weight(factor);
            assert!((0.1..=1.0).contains(&w), "weight for {factor} escaped: {w}");
        }
        let [t1, t2, t3] = state.thresholds;
        assert!(t1 < t2 && t2 < t3);
    }

    #[test]
    fn test_invalid_proposal_rejected_and_prior_retained() {
        // A tiny threshold gap makes repeated upward shifts of t1
        // eventually propose t1 >= t2; that proposal must be rejected.
        let config = CrucibleConfig {
            calibration_window: 2,
            initial_thresholds: [2.5, 3.0, 7.5],
            threshold_step: 1.0,
            ..Default::default()
        };
        let (store, calibrator, tracker) = setup(&config);

        for _ in 0..2 {
            tracker.record(
                decision(2.0, Tier::Skip, FactorLevel::None),
                OutcomeSignal::OverApplied,
            );
        }
        // Proposal shifts t1 from 2.5 to 3.5, crossing t2 = 3.0.
        assert!(calibrator.maybe_calibrate(&tracker).is_none());
        let state = store.snapshot();
        assert_eq!(state.version, 1);
        assert!((state.thresholds[0] - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_at_most_one_pass_per_window() {
        let config = small_config();
        let (_, calibrator, tracker) = setup(&config);
        for _ in 0..10 {
            tracker.record(
                decision(8.0, Tier::Deep, FactorLevel::Strong),
                OutcomeSignal::OverApplied,
            );
        }
        assert!(calibrator.maybe_calibrate(&tracker).is_some());
        // Counter was consumed; an immediate second call is a no-op.
        assert!(calibrator.maybe_calibrate(&tracker).is_none());
    }
}

//! Structured observability hooks for the request lifecycle.
//!
//! Emission functions for the key events: triage, clarification, loop
//! completion, outcome recording, calibration. Events are emitted at
//! `info!` level and filtered via `RUST_LOG`.

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{OutcomeSignal, Tier};

/// RAII guard that enters a request-scoped tracing span.
pub struct RequestSpan {
    _span: tracing::span::EnteredSpan,
}

impl RequestSpan {
    pub fn enter(request_id: Uuid) -> Self {
        let span = tracing::info_span!("crucible.request", request_id = %request_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: triage gate decided a tier.
pub fn emit_triage_decided(decision_id: Uuid, total_score: f64, tier: Tier, weights_version: u32) {
    info!(
        event = "triage.decided",
        decision_id = %decision_id,
        total_score = total_score,
        tier = %tier,
        weights_version = weights_version,
    );
}

/// Emit event: the factor scorer demanded clarification instead.
pub fn emit_clarification_requested(request_id: Uuid) {
    info!(event = "triage.clarify", request_id = %request_id);
}

/// Emit event: validation loop finished.
pub fn emit_loop_finished(request_id: Uuid, tier: Tier, iterations: usize, converged: bool, composite: f64) {
    info!(
        event = "loop.finished",
        request_id = %request_id,
        tier = %tier,
        iterations = iterations,
        converged = converged,
        composite = composite,
    );
}

/// Emit event: an outcome signal was recorded for a decision.
pub fn emit_outcome_recorded(decision_id: Uuid, signal: OutcomeSignal) {
    info!(event = "outcome.recorded", decision_id = %decision_id, signal = %signal);
}

/// Emit event: a calibration pass swapped in a new state.
pub fn emit_calibration_applied(version: u32, accuracy: f64) {
    info!(event = "calibration.applied", version = version, accuracy = accuracy);
}

/// Emit event: a calibration proposal was rejected (warning level).
pub fn emit_calibration_rejected(error: &dyn std::fmt::Display) {
    warn!(event = "calibration.rejected", error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_span_create() {
        let _span = RequestSpan::enter(Uuid::new_v4());
    }
}

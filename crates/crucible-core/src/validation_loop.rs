//! Layer-1 validation loop: score, evolve, repeat.
//!
//! The loop is a two-state machine per iteration — SCORING, then
//! EVOLVING — terminating on convergence (composite at or above the
//! pass bar) or an exhausted iteration budget. The evolve step awaits
//! the external collaborator, so a suspended loop never occupies a
//! worker; cancellation at any await point simply discards the
//! in-flight revision.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::dimensions::{DimensionRegistry, ScoringContext};
use crate::domain::{Candidate, DimensionScore, Tier};
use crate::evolver::{revise_bounded, Evolver, WeakDimension};
use crate::mode::ModeParameters;

/// Why the loop stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Termination {
    Converged,
    /// Iteration budget spent, or the evolver failed twice (the reason
    /// carries the second failure).
    BudgetExhausted { reason: Option<String> },
}

/// One scored iteration, kept for history and best-of selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: u32,
    pub composite: f64,
    pub dimension_scores: BTreeMap<String, DimensionScore>,
}

/// Final result of one validation loop run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopOutcome {
    /// Best-scoring candidate when the budget ran out; the converging
    /// candidate otherwise.
    pub final_candidate: Candidate,
    pub history: Vec<IterationRecord>,
    pub converged: bool,
    pub termination: Termination,
}

/// Drives scoring and evolution for a single request's candidate.
pub struct ValidationLoop<'a> {
    registry: &'a DimensionRegistry,
    evolver: &'a dyn Evolver,
    evolver_wait_ms: u64,
}

impl<'a> ValidationLoop<'a> {
    pub fn new(registry: &'a DimensionRegistry, evolver: &'a dyn Evolver, evolver_wait_ms: u64) -> Self {
        Self {
            registry,
            evolver,
            evolver_wait_ms,
        }
    }

    /// Run the loop to convergence or budget exhaustion.
    ///
    /// The candidate is owned exclusively by this call; no other request
    /// ever observes it.
    pub async fn run(
        &self,
        initial: Candidate,
        tier: Tier,
        params: ModeParameters,
        ctx: &ScoringContext,
    ) -> LoopOutcome {
        let max_iterations = params.max_iterations(tier).max(1);
        let mut candidate = initial;
        let mut history: Vec<IterationRecord> = Vec::new();
        let mut best: Option<Candidate> = None;

        loop {
            // SCORING
            let scores = self.registry.score_all(&candidate, ctx);
            let scored = candidate.with_scores(scores);
            debug!(
                request_id = %ctx.request_id,
                iteration = scored.iteration,
                composite = scored.composite,
                "candidate scored"
            );
            history.push(IterationRecord {
                iteration: scored.iteration,
                composite: scored.composite,
                dimension_scores: scored.dimension_scores.clone(),
            });

            if best.as_ref().map_or(true, |b| scored.composite > b.composite) {
                best = Some(scored.clone());
            }

            if scored.composite >= params.pass_bar {
                return LoopOutcome {
                    final_candidate: scored,
                    history,
                    converged: true,
                    termination: Termination::Converged,
                };
            }

            if history.len() as u32 >= max_iterations || !tier.evolves() {
                return LoopOutcome {
                    final_candidate: best.expect("at least one iteration scored"),
                    history,
                    converged: false,
                    termination: Termination::BudgetExhausted { reason: None },
                };
            }

            // EVOLVING — retry once with identical input on failure.
            let weak = weak_dimensions(&scored, params.pass_bar);
            let revised = match revise_bounded(self.evolver, &scored, &weak, self.evolver_wait_ms).await
            {
                Ok(revised) => revised,
                Err(first) => {
                    warn!(
                        request_id = %ctx.request_id,
                        iteration = scored.iteration,
                        error = %first,
                        "evolver failed, retrying once"
                    );
                    match revise_bounded(self.evolver, &scored, &weak, self.evolver_wait_ms).await {
                        Ok(revised) => revised,
                        Err(second) => {
                            warn!(
                                request_id = %ctx.request_id,
                                error = %second,
                                "evolver failed twice, returning best candidate so far"
                            );
                            return LoopOutcome {
                                final_candidate: best.expect("at least one iteration scored"),
                                history,
                                converged: false,
                                termination: Termination::BudgetExhausted {
                                    reason: Some(second.to_string()),
                                },
                            };
                        }
                    }
                }
            };
            candidate = revised;
        }
    }
}

/// Dimensions scoring below the pass bar, with their rationales.
fn weak_dimensions(candidate: &Candidate, pass_bar: f64) -> Vec<WeakDimension> {
    candidate
        .dimension_scores
        .iter()
        .filter(|(_, score)| score.value < pass_bar)
        .map(|(name, score)| WeakDimension {
            name: name.clone(),
            score: score.value,
            rationale: score.rationale.clone(),
        })
        .collect()
}

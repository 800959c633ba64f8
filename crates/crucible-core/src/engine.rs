//! The Crucible engine facade: triage, validate, learn.
//!
//! Wires the factor scorer, triage gate, validation loop, outcome
//! tracker, and calibrator behind one entry point. Construction goes
//! through [`CrucibleBuilder`], which validates the configuration and
//! the scorer registry up front — wiring problems are fatal at build
//! time, never discovered mid-request.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calibration::{CalibrationState, CalibrationStore};
use crate::calibrator::Calibrator;
use crate::config::CrucibleConfig;
use crate::dimensions::{DimensionRegistry, DimensionScorer, ScoringContext};
use crate::domain::{
    Candidate, CrucibleError, OutcomeSignal, Request, Result, TriageDecision,
};
use crate::evolver::Evolver;
use crate::factor_scorer::{FactorOutcome, FactorScorer};
use crate::gate;
use crate::journal::{JournalEntry, JournalSink, NullJournal};
use crate::mode::{Mode, ModeController};
use crate::obs;
use crate::outcome_tracker::OutcomeTracker;
use crate::validation_loop::{IterationRecord, Termination, ValidationLoop};

/// Result of evaluating one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Evaluation {
    /// The request is pure ambiguity; ask a clarifying question before
    /// resubmitting.
    NeedsClarification { request_id: Uuid },
    Completed(EvaluationReport),
}

/// Everything the caller learns from a completed evaluation.
///
/// `candidate`, `converged`, and `termination` are absent for skipped
/// requests — there was no validation loop to report on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub decision: TriageDecision,
    pub candidate: Option<Candidate>,
    pub converged: Option<bool>,
    pub history: Vec<IterationRecord>,
    pub termination: Option<Termination>,
}

/// Builder for [`CrucibleEngine`]; collects collaborators and validates
/// the wiring.
pub struct CrucibleBuilder {
    config: CrucibleConfig,
    scorers: Vec<Arc<dyn DimensionScorer>>,
    evolver: Option<Arc<dyn Evolver>>,
    journal: Arc<dyn JournalSink>,
    mode: Mode,
}

impl CrucibleBuilder {
    pub fn new() -> Self {
        Self {
            config: CrucibleConfig::default(),
            scorers: Vec::new(),
            evolver: None,
            journal: Arc::new(NullJournal),
            mode: Mode::default(),
        }
    }

    pub fn with_config(mut self, config: CrucibleConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a dimension scorer. Every dimension declared in the
    /// configuration needs exactly one.
    pub fn register_scorer(mut self, scorer: Arc<dyn DimensionScorer>) -> Self {
        self.scorers.push(scorer);
        self
    }

    pub fn with_scorers(mut self, scorers: Vec<Arc<dyn DimensionScorer>>) -> Self {
        self.scorers.extend(scorers);
        self
    }

    pub fn with_evolver(mut self, evolver: Arc<dyn Evolver>) -> Self {
        self.evolver = Some(evolver);
        self
    }

    pub fn with_journal(mut self, journal: Arc<dyn JournalSink>) -> Self {
        self.journal = journal;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Validate configuration and wiring, then assemble the engine.
    pub fn build(self) -> Result<CrucibleEngine> {
        self.config.validate()?;

        let factor_scorer = FactorScorer::new(&self.config.indicators)?;
        let registry = DimensionRegistry::new(&self.config.dimensions, self.scorers)?;
        let evolver = self.evolver.ok_or_else(|| {
            CrucibleError::Config("an evolver collaborator is required".to_string())
        })?;

        let store = Arc::new(CalibrationStore::new(CalibrationState::initial(&self.config))?);
        let calibrator = Calibrator::new(Arc::clone(&store), &self.config);

        Ok(CrucibleEngine {
            config: self.config,
            factor_scorer,
            registry,
            evolver,
            store,
            calibrator,
            tracker: OutcomeTracker::new(),
            journal: self.journal,
            mode: RwLock::new(self.mode),
            pending: Mutex::new(HashMap::new()),
        })
    }
}

impl Default for CrucibleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Public facade composing the whole triage-and-validate pipeline.
///
/// Safe to share behind an `Arc` and call concurrently: the scoring
/// paths are stateless, the calibration state is snapshotted per
/// request, and the trackers guard their own appends.
pub struct CrucibleEngine {
    config: CrucibleConfig,
    factor_scorer: FactorScorer,
    registry: DimensionRegistry,
    evolver: Arc<dyn Evolver>,
    store: Arc<CalibrationStore>,
    calibrator: Calibrator,
    tracker: OutcomeTracker,
    journal: Arc<dyn JournalSink>,
    mode: RwLock<Mode>,
    /// Decisions awaiting an outcome report, by decision id.
    pending: Mutex<HashMap<Uuid, TriageDecision>>,
}

impl std::fmt::Debug for CrucibleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrucibleEngine")
            .field("config", &self.config)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl CrucibleEngine {
    pub fn builder() -> CrucibleBuilder {
        CrucibleBuilder::new()
    }

    /// The active operating mode.
    pub fn mode(&self) -> Mode {
        *self.mode.read().expect("mode lock poisoned")
    }

    /// Switch the operating mode. In-flight requests keep the mode they
    /// snapshotted at entry.
    pub fn set_mode(&self, mode: Mode) {
        *self.mode.write().expect("mode lock poisoned") = mode;
    }

    /// Snapshot of the active calibration state.
    pub fn calibration(&self) -> Arc<CalibrationState> {
        self.store.snapshot()
    }

    /// Triage accuracy over the trailing outcome window.
    pub fn accuracy(&self, window: usize) -> f64 {
        self.tracker.accuracy(window)
    }

    /// Evaluate one request: triage it, and run the validation loop for
    /// any tier above skip.
    ///
    /// The mode is read exactly once, here; concurrent `set_mode` calls
    /// never affect a request already past this point.
    #[tracing::instrument(skip(self, request), fields(request_id = %request.id))]
    pub async fn evaluate(&self, request: &Request) -> Evaluation {
        let mode = self.mode();

        let factors = match self.factor_scorer.score(request, mode) {
            FactorOutcome::Scored(factors) => factors,
            FactorOutcome::Clarify => {
                obs::emit_clarification_requested(request.id);
                self.journal.append(&JournalEntry::ClarificationRequested {
                    request_id: request.id,
                });
                return Evaluation::NeedsClarification {
                    request_id: request.id,
                };
            }
        };

        let snapshot = self.store.snapshot();
        let decision = gate::decide(request.id, factors, &snapshot, mode);
        obs::emit_triage_decided(
            decision.id,
            decision.total_score,
            decision.tier,
            decision.weights_version,
        );
        self.journal.append(&JournalEntry::TriageDecided {
            decision: decision.clone(),
        });
        self.pending
            .lock()
            .expect("pending decisions poisoned")
            .insert(decision.id, decision.clone());

        if !decision.tier.validates() {
            return Evaluation::Completed(EvaluationReport {
                decision,
                candidate: None,
                converged: None,
                history: Vec::new(),
                termination: None,
            });
        }

        let ctx = ScoringContext {
            request_id: request.id,
            payload: request.payload.clone(),
            tags: request
                .declared_context
                .as_ref()
                .map(|c| c.tags.clone())
                .unwrap_or_default(),
            tier: decision.tier,
        };
        let params = ModeController::parameters(mode);
        let outcome = ValidationLoop::new(
            &self.registry,
            self.evolver.as_ref(),
            self.config.evolver_wait_ms,
        )
        .run(Candidate::initial(&request.payload), decision.tier, params, &ctx)
        .await;

        obs::emit_loop_finished(
            request.id,
            decision.tier,
            outcome.history.len(),
            outcome.converged,
            outcome.final_candidate.composite,
        );
        self.journal.append(&JournalEntry::LoopCompleted {
            request_id: request.id,
            tier: decision.tier,
            iterations: outcome.history.len(),
            converged: outcome.converged,
            termination: outcome.termination.clone(),
            composite: outcome.final_candidate.composite,
        });

        Evaluation::Completed(EvaluationReport {
            decision,
            candidate: Some(outcome.final_candidate),
            converged: Some(outcome.converged),
            history: outcome.history,
            termination: Some(outcome.termination),
        })
    }

    /// Factor-score and tier a request without running the validation
    /// loop or registering the decision for outcome tracking — a
    /// dry-run preview of what [`evaluate`](Self::evaluate) would
    /// decide. Returns `None` when the scorer demands clarification.
    pub fn evaluate_triage_only(&self, request: &Request) -> Option<TriageDecision> {
        let mode = self.mode();
        let _span = obs::RequestSpan::enter(request.id);
        match self.factor_scorer.score(request, mode) {
            FactorOutcome::Clarify => None,
            FactorOutcome::Scored(factors) => {
                Some(gate::decide(request.id, factors, &self.store.snapshot(), mode))
            }
        }
    }

    /// Record the observed correctness of an earlier decision, and run a
    /// calibration pass when a window has filled.
    ///
    /// Returns the new calibration state when one was swapped in. Each
    /// decision accepts exactly one report; an unknown or already
    /// reported id is an error.
    pub fn report_outcome(
        &self,
        decision_id: Uuid,
        signal: OutcomeSignal,
    ) -> Result<Option<Arc<CalibrationState>>> {
        let decision = self
            .pending
            .lock()
            .expect("pending decisions poisoned")
            .remove(&decision_id)
            .ok_or(CrucibleError::UnknownDecision(decision_id))?;

        self.tracker.record(decision, signal);
        obs::emit_outcome_recorded(decision_id, signal);
        self.journal.append(&JournalEntry::OutcomeRecorded {
            decision_id,
            signal,
        });

        let swapped = self.calibrator.maybe_calibrate(&self.tracker);
        if let Some(state) = &swapped {
            obs::emit_calibration_applied(state.version, self.tracker.accuracy(self.config.calibration_window));
            self.journal.append(&JournalEntry::CalibrationApplied {
                version: state.version,
                thresholds: state.thresholds,
            });
        }
        Ok(swapped)
    }
}

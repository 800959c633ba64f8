//! Crucible Core Library
//!
//! An adaptive two-layer decision/validation engine: a triage gate
//! decides how much scrutiny a request deserves, a validation loop
//! scores and iteratively improves candidates, and a calibrator tunes
//! the gate from observed outcomes.

pub mod calibration;
pub mod calibrator;
pub mod config;
pub mod dimensions;
pub mod domain;
pub mod engine;
pub mod evolver;
pub mod factor_scorer;
pub mod fakes;
pub mod gate;
pub mod journal;
pub mod mode;
pub mod obs;
pub mod outcome_tracker;
pub mod scorers;
pub mod telemetry;
pub mod validation_loop;

pub use domain::{
    composite_of, Candidate, CrucibleError, DimensionScore, Factor, FactorLevel, FactorScores,
    OutcomeRecord, OutcomeSignal, Request, RequestContext, Result, Tier, TriageDecision,
    DIMENSION_SCORE_MAX,
};

pub use calibration::{CalibrationState, CalibrationStore};
pub use calibrator::Calibrator;
pub use config::{CrucibleConfig, IndicatorRule};
pub use dimensions::{DimensionRegistry, DimensionScorer, ScoringContext};
pub use engine::{CrucibleBuilder, CrucibleEngine, Evaluation, EvaluationReport};
pub use evolver::{revise_bounded, Evolver, RewriteEvolver, WeakDimension};
pub use factor_scorer::{FactorOutcome, FactorScorer};
pub use gate::{decide, locate_tier};
pub use journal::{
    read_calibration_artifact, write_calibration_artifact, CalibrationArtifact, JournalEntry,
    JournalSink, MemoryJournal, NullJournal, TracingJournal,
};
pub use mode::{Mode, ModeController, ModeParameters};
pub use outcome_tracker::{OutcomeTracker, DEFAULT_ACCURACY_WINDOW};
pub use scorers::{
    default_scorers, ActionabilityScorer, ClarityScorer, CompletenessScorer, SpecificityScorer,
    StructureScorer,
};
pub use telemetry::{init_from_flags, init_tracing};
pub use validation_loop::{IterationRecord, LoopOutcome, Termination, ValidationLoop};

/// Crucible version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

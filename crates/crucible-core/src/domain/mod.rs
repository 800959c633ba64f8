//! Core domain types for the Crucible engine.

pub mod candidate;
pub mod error;
pub mod factors;
pub mod outcome;
pub mod request;
pub mod triage;

pub use candidate::{composite_of, Candidate, DimensionScore, DIMENSION_SCORE_MAX};
pub use error::{CrucibleError, Result};
pub use factors::{Factor, FactorLevel, FactorScores};
pub use outcome::{OutcomeRecord, OutcomeSignal};
pub use request::{Request, RequestContext};
pub use triage::{Tier, TriageDecision};

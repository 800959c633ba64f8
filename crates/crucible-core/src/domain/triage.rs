//! Triage tiers and decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::factors::FactorScores;

/// Depth of validation applied to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Answer directly, no validation loop.
    Skip,
    /// Single scoring pass, no revision.
    Light,
    /// Score-and-revise up to the standard budget.
    Full,
    /// Score-and-revise with the extended budget.
    Deep,
}

impl Tier {
    /// Base iteration budget before the mode multiplier is applied.
    /// Light is score-only: one iteration, never an evolve step.
    pub fn base_max_iterations(self) -> u32 {
        match self {
            Self::Skip => 0,
            Self::Light => 1,
            Self::Full => 3,
            Self::Deep => 5,
        }
    }

    /// Whether the validation loop runs at all for this tier.
    pub fn validates(self) -> bool {
        self != Self::Skip
    }

    /// Whether the loop may hand weak candidates to the evolver.
    pub fn evolves(self) -> bool {
        matches!(self, Self::Full | Self::Deep)
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Light => write!(f, "light"),
            Self::Full => write!(f, "full"),
            Self::Deep => write!(f, "deep"),
        }
    }
}

/// The triage gate's verdict for one request. Immutable; referenced by
/// the outcome tracker and calibrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageDecision {
    pub id: Uuid,
    pub request_id: Uuid,
    /// The factor scores the total was computed from. Kept on the
    /// decision so calibration can correlate factors with
    /// misclassification direction long after the request is gone.
    pub factors: FactorScores,
    /// Weighted factor total, rounded to the nearest whole point (0–10
    /// under equal weights).
    pub total_score: f64,
    pub tier: Tier,
    /// Version of the calibration state the decision was made under.
    pub weights_version: u32,
    pub decided_at: DateTime<Utc>,
}

//! Observed correctness of triage decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::triage::TriageDecision;

/// Eventual correctness signal for a triage decision, supplied by the
/// caller: user pushback after a skip means the gate under-applied,
/// a flagged overkill means it over-applied, silence within the
/// caller's feedback window is reported as correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeSignal {
    Correct,
    OverApplied,
    UnderApplied,
    Unknown,
}

impl OutcomeSignal {
    /// Whether the signal carries evidence about the gate's accuracy.
    /// Unknown outcomes are excluded from accuracy denominators.
    pub fn is_resolved(self) -> bool {
        self != Self::Unknown
    }

    pub fn is_misclassification(self) -> bool {
        matches!(self, Self::OverApplied | Self::UnderApplied)
    }
}

impl std::fmt::Display for OutcomeSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Correct => write!(f, "correct"),
            Self::OverApplied => write!(f, "over_applied"),
            Self::UnderApplied => write!(f, "under_applied"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// One append-only entry in the outcome log: the decision as made plus
/// the signal observed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// Monotonic sequence assigned by the tracker at append time.
    pub seq: u64,
    pub decision: TriageDecision,
    pub signal: OutcomeSignal,
    pub recorded_at: DateTime<Utc>,
}

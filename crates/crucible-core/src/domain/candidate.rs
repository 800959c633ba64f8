//! Candidates under validation and their per-dimension scores.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Score range for a single quality dimension.
pub const DIMENSION_SCORE_MAX: f64 = 10.0;

/// One dimension's verdict on a candidate: a 0–10 value plus the
/// rationale the evolver gets to act on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub value: f64,
    pub rationale: String,
}

impl DimensionScore {
    /// Clamps the value into the 0–10 range.
    pub fn new(value: f64, rationale: impl Into<String>) -> Self {
        Self {
            value: value.clamp(0.0, DIMENSION_SCORE_MAX),
            rationale: rationale.into(),
        }
    }
}

/// The artifact under validation/improvement.
///
/// Owned exclusively by the validation loop processing one request —
/// never shared across requests, never locked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub content: String,
    /// 0 for the initial candidate, incremented by each evolver revision.
    pub iteration: u32,
    pub dimension_scores: BTreeMap<String, DimensionScore>,
    /// Deterministic aggregate of `dimension_scores`; see [`composite_of`].
    pub composite: f64,
}

impl Candidate {
    /// The initial, not-yet-scored candidate for a request.
    pub fn initial(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            iteration: 0,
            dimension_scores: BTreeMap::new(),
            composite: 0.0,
        }
    }

    /// A revision produced by the evolver at the next iteration.
    pub fn revision(content: impl Into<String>, iteration: u32) -> Self {
        Self {
            content: content.into(),
            iteration,
            dimension_scores: BTreeMap::new(),
            composite: 0.0,
        }
    }

    /// Attach dimension scores and the composite derived from them.
    pub fn with_scores(mut self, scores: BTreeMap<String, DimensionScore>) -> Self {
        self.composite = composite_of(&scores);
        self.dimension_scores = scores;
        self
    }
}

/// Aggregate dimension scores into the composite: the arithmetic mean of
/// all dimension values.
///
/// The aggregation is fixed. Historical calibration data is only
/// comparable while every composite was computed the same way, so
/// changing this function invalidates every recorded outcome.
pub fn composite_of(scores: &BTreeMap<String, DimensionScore>) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.values().map(|s| s.value).sum::<f64>() / scores.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: &[(&str, f64)]) -> BTreeMap<String, DimensionScore> {
        values
            .iter()
            .map(|(name, v)| (name.to_string(), DimensionScore::new(*v, "test")))
            .collect()
    }

    #[test]
    fn test_dimension_score_clamps() {
        assert!((DimensionScore::new(12.0, "r").value - 10.0).abs() < f64::EPSILON);
        assert!((DimensionScore::new(-1.0, "r").value - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_composite_is_mean() {
        let s = scores(&[("a", 6.0), ("b", 8.0), ("c", 10.0)]);
        assert!((composite_of(&s) - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_composite_of_empty_is_zero() {
        assert!((composite_of(&BTreeMap::new()) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_with_scores_sets_composite() {
        let candidate = Candidate::initial("draft").with_scores(scores(&[("a", 4.0), ("b", 6.0)]));
        assert!((candidate.composite - 5.0).abs() < f64::EPSILON);
        assert_eq!(candidate.iteration, 0);
    }

    #[test]
    fn test_revision_increments_iteration() {
        let rev = Candidate::revision("better draft", 2);
        assert_eq!(rev.iteration, 2);
        assert!(rev.dimension_scores.is_empty());
    }
}

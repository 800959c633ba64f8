//! Quality dimension scorers and their registry.
//!
//! The engine is agnostic to what a dimension measures — code quality,
//! prose, architecture. It only requires the contract: a pure function
//! from (candidate, context) to a 0–10 value plus a rationale. Scorers
//! are registered by name at startup; a declared dimension without a
//! scorer is a fatal configuration error, while a scorer that fails at
//! evaluation time scores its dimension 0 for that iteration and the
//! evaluation continues.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::domain::{Candidate, CrucibleError, DimensionScore, Result, Tier};

/// Caller-supplied context handed to every dimension scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringContext {
    pub request_id: Uuid,
    /// The original request payload the candidate answers.
    pub payload: String,
    pub tags: Vec<String>,
    pub tier: Tier,
}

/// A pluggable strategy scoring one quality dimension.
///
/// Implementations must be pure: no side effects, identical inputs give
/// identical scores.
pub trait DimensionScorer: Send + Sync {
    /// The dimension name this scorer is registered under.
    fn dimension(&self) -> &str;

    /// Score `candidate` in 0–10 with a rationale the evolver can act on.
    fn score(&self, candidate: &Candidate, ctx: &ScoringContext) -> Result<DimensionScore>;
}

/// Startup-validated set of scorers covering the declared dimensions.
pub struct DimensionRegistry {
    scorers: BTreeMap<String, Arc<dyn DimensionScorer>>,
}

impl std::fmt::Debug for DimensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DimensionRegistry")
            .field("scorers", &self.scorers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DimensionRegistry {
    /// Build the registry, requiring a scorer for every declared
    /// dimension. Scorers for undeclared dimensions are dropped with a
    /// warning.
    pub fn new(declared: &[String], scorers: Vec<Arc<dyn DimensionScorer>>) -> Result<Self> {
        let mut by_name: BTreeMap<String, Arc<dyn DimensionScorer>> = BTreeMap::new();
        for scorer in scorers {
            let name = scorer.dimension().to_string();
            if declared.contains(&name) {
                by_name.insert(name, scorer);
            } else {
                warn!(dimension = %name, "scorer registered for undeclared dimension, ignoring");
            }
        }

        for dim in declared {
            if !by_name.contains_key(dim) {
                return Err(CrucibleError::Config(format!(
                    "no scorer registered for declared dimension: {dim}"
                )));
            }
        }

        Ok(Self { scorers: by_name })
    }

    /// Declared dimension names in canonical (sorted) order.
    pub fn dimensions(&self) -> impl Iterator<Item = &str> {
        self.scorers.keys().map(String::as_str)
    }

    /// Score every dimension. A scorer failure is logged and scored 0
    /// for this iteration; scoring never aborts the evaluation.
    pub fn score_all(
        &self,
        candidate: &Candidate,
        ctx: &ScoringContext,
    ) -> BTreeMap<String, DimensionScore> {
        self.scorers
            .iter()
            .map(|(name, scorer)| {
                let score = match scorer.score(candidate, ctx) {
                    Ok(score) => score,
                    Err(e) => {
                        warn!(dimension = %name, error = %e, "dimension scorer failed, scoring 0");
                        DimensionScore::new(0.0, format!("scorer failed: {e}"))
                    }
                };
                (name.clone(), score)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedScorer {
        name: &'static str,
        value: f64,
    }

    impl DimensionScorer for FixedScorer {
        fn dimension(&self) -> &str {
            self.name
        }

        fn score(&self, _candidate: &Candidate, _ctx: &ScoringContext) -> Result<DimensionScore> {
            Ok(DimensionScore::new(self.value, "fixed"))
        }
    }

    struct BrokenScorer;

    impl DimensionScorer for BrokenScorer {
        fn dimension(&self) -> &str {
            "broken"
        }

        fn score(&self, _candidate: &Candidate, _ctx: &ScoringContext) -> Result<DimensionScore> {
            Err(CrucibleError::Scoring {
                dimension: "broken".to_string(),
                reason: "synthetic failure".to_string(),
            })
        }
    }

    fn ctx() -> ScoringContext {
        ScoringContext {
            request_id: Uuid::new_v4(),
            payload: "payload".to_string(),
            tags: vec![],
            tier: Tier::Full,
        }
    }

    #[test]
    fn test_missing_scorer_is_config_error() {
        let declared = vec!["clarity".to_string(), "structure".to_string()];
        let err = DimensionRegistry::new(
            &declared,
            vec![Arc::new(FixedScorer { name: "clarity", value: 7.0 })],
        )
        .unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("structure"));
    }

    #[test]
    fn test_score_all_covers_every_dimension() {
        let declared = vec!["a".to_string(), "b".to_string()];
        let registry = DimensionRegistry::new(
            &declared,
            vec![
                Arc::new(FixedScorer { name: "a", value: 6.0 }),
                Arc::new(FixedScorer { name: "b", value: 9.0 }),
            ],
        )
        .unwrap();

        let scores = registry.score_all(&Candidate::initial("text"), &ctx());
        assert_eq!(scores.len(), 2);
        assert!((scores["a"].value - 6.0).abs() < f64::EPSILON);
        assert!((scores["b"].value - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_failed_scorer_scores_zero_and_continues() {
        let declared = vec!["broken".to_string(), "ok".to_string()];
        let registry = DimensionRegistry::new(
            &declared,
            vec![
                Arc::new(BrokenScorer),
                Arc::new(FixedScorer { name: "ok", value: 8.0 }),
            ],
        )
        .unwrap();

        let scores = registry.score_all(&Candidate::initial("text"), &ctx());
        assert!((scores["broken"].value - 0.0).abs() < f64::EPSILON);
        assert!(scores["broken"].rationale.contains("scorer failed"));
        assert!((scores["ok"].value - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_undeclared_scorer_is_ignored() {
        let declared = vec!["a".to_string()];
        let registry = DimensionRegistry::new(
            &declared,
            vec![
                Arc::new(FixedScorer { name: "a", value: 5.0 }),
                Arc::new(FixedScorer { name: "extra", value: 5.0 }),
            ],
        )
        .unwrap();
        assert_eq!(registry.dimensions().count(), 1);
    }
}

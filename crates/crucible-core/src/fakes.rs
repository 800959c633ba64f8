//! Deterministic fakes for the collaborator contracts (testing only).
//!
//! Provides scripted scorers and evolvers that satisfy the trait
//! contracts without any external dependencies, so loop and engine
//! behavior can be pinned exactly.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::dimensions::{DimensionScorer, ScoringContext};
use crate::domain::{Candidate, CrucibleError, DimensionScore, Result};
use crate::evolver::{Evolver, WeakDimension};

/// Scores a dimension from a script of per-iteration values; iterations
/// beyond the script reuse the last value.
pub struct ScriptedScorer {
    name: String,
    values: Vec<f64>,
}

impl ScriptedScorer {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "script needs at least one value");
        Self {
            name: name.into(),
            values,
        }
    }
}

impl DimensionScorer for ScriptedScorer {
    fn dimension(&self) -> &str {
        &self.name
    }

    fn score(&self, candidate: &Candidate, _ctx: &ScoringContext) -> Result<DimensionScore> {
        let idx = (candidate.iteration as usize).min(self.values.len() - 1);
        Ok(DimensionScore::new(
            self.values[idx],
            format!("scripted value for iteration {}", candidate.iteration),
        ))
    }
}

/// Rewrites the candidate content deterministically and counts calls.
pub struct CountingEvolver {
    calls: Mutex<u32>,
}

impl CountingEvolver {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

impl Default for CountingEvolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Evolver for CountingEvolver {
    async fn revise(&self, candidate: &Candidate, _weak: &[WeakDimension]) -> Result<Candidate> {
        *self.calls.lock().unwrap() += 1;
        Ok(Candidate::revision(
            format!("{} (revised)", candidate.content),
            candidate.iteration + 1,
        ))
    }
}

/// Fails every call from `fail_from_iteration` onward (0-based on the
/// candidate handed in), succeeding deterministically before that.
pub struct FailingEvolver {
    fail_from_iteration: u32,
    calls: Mutex<u32>,
}

impl FailingEvolver {
    pub fn new(fail_from_iteration: u32) -> Self {
        Self {
            fail_from_iteration,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Evolver for FailingEvolver {
    async fn revise(&self, candidate: &Candidate, _weak: &[WeakDimension]) -> Result<Candidate> {
        *self.calls.lock().unwrap() += 1;
        if candidate.iteration >= self.fail_from_iteration {
            return Err(CrucibleError::Evolver("synthetic evolver failure".to_string()));
        }
        Ok(Candidate::revision(
            format!("{} (revised)", candidate.content),
            candidate.iteration + 1,
        ))
    }
}

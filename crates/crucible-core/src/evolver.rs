//! The evolver collaborator: revises weak candidates.
//!
//! The engine never inspects how a revision was produced — the evolver
//! may be a human, a generative model behind a network call, or a
//! deterministic rewriter. The loop only hands over the candidate plus
//! the rationales for every dimension below the pass bar, and expects a
//! new candidate at the next iteration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::{timeout, Duration};

use crate::domain::{Candidate, CrucibleError, Result};

/// One under-performing dimension, as fed back to the evolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakDimension {
    pub name: String,
    pub score: f64,
    pub rationale: String,
}

/// External collaborator that produces candidate revisions.
#[async_trait]
pub trait Evolver: Send + Sync {
    /// Produce a revision of `candidate` at `candidate.iteration + 1`,
    /// guided by the weak-dimension feedback.
    async fn revise(&self, candidate: &Candidate, weak: &[WeakDimension]) -> Result<Candidate>;
}

/// Call the evolver with a bounded wait and sanity-check the result.
///
/// A timeout or an unusable candidate (empty content, wrong iteration)
/// surfaces as an error; the validation loop counts each toward its
/// retry-once policy.
pub async fn revise_bounded(
    evolver: &dyn Evolver,
    candidate: &Candidate,
    weak: &[WeakDimension],
    wait_ms: u64,
) -> Result<Candidate> {
    let wait = Duration::from_millis(wait_ms);
    let revised = match timeout(wait, evolver.revise(candidate, weak)).await {
        Ok(result) => result?,
        Err(_) => return Err(CrucibleError::EvolverTimeout { wait_ms }),
    };

    if revised.content.trim().is_empty() {
        return Err(CrucibleError::Evolver(
            "evolver returned an empty candidate".to_string(),
        ));
    }
    if revised.iteration != candidate.iteration + 1 {
        return Err(CrucibleError::Evolver(format!(
            "evolver returned iteration {}, expected {}",
            revised.iteration,
            candidate.iteration + 1
        )));
    }
    Ok(revised)
}

/// Deterministic rewriter used by the CLI and as a reference
/// implementation: appends an addressed-feedback section per weak
/// dimension so downstream scorers see the gaps acknowledged.
pub struct RewriteEvolver;

#[async_trait]
impl Evolver for RewriteEvolver {
    async fn revise(&self, candidate: &Candidate, weak: &[WeakDimension]) -> Result<Candidate> {
        let mut content = candidate.content.clone();
        if !weak.is_empty() {
            content.push_str("\n\nRevision notes:");
            for dim in weak {
                content.push_str(&format!("\n- {}: {}", dim.name, dim.rationale));
            }
        }
        Ok(Candidate::revision(content, candidate.iteration + 1))
    }
}

//! Domain-level error taxonomy for Crucible.

/// Crucible domain errors.
///
/// Only [`CrucibleError::Config`] is fatal to the caller; every other
/// variant is handled inside the engine and degrades the evaluation
/// instead of failing it.
#[derive(Debug, thiserror::Error)]
pub enum CrucibleError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("dimension scorer {dimension} failed: {reason}")]
    Scoring { dimension: String, reason: String },

    #[error("evolver error: {0}")]
    Evolver(String),

    #[error("evolver timed out after {wait_ms}ms")]
    EvolverTimeout { wait_ms: u64 },

    #[error("calibration error: {0}")]
    Calibration(String),

    #[error("unknown decision: {0}")]
    UnknownDecision(uuid::Uuid),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrucibleError {
    /// Whether this error must abort the caller (startup wiring problems).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Result type for Crucible domain operations.
pub type Result<T> = std::result::Result<T, CrucibleError>;

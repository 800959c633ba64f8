//! Journal sink contract and calibration artifacts.
//!
//! The engine journals decisions, loop results, and calibration events
//! through the narrow [`JournalSink`] contract; the persistence format
//! behind a sink is a collaborator concern. Calibration states can also
//! be persisted as digest-verified JSON artifacts for audit.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest as Sha2Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use crate::calibration::CalibrationState;
use crate::domain::{CrucibleError, OutcomeSignal, Result, Tier, TriageDecision};
use crate::validation_loop::Termination;

/// One journaled engine event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JournalEntry {
    TriageDecided {
        decision: TriageDecision,
    },
    ClarificationRequested {
        request_id: Uuid,
    },
    LoopCompleted {
        request_id: Uuid,
        tier: Tier,
        iterations: usize,
        converged: bool,
        termination: Termination,
        composite: f64,
    },
    OutcomeRecorded {
        decision_id: Uuid,
        signal: OutcomeSignal,
    },
    CalibrationApplied {
        version: u32,
        thresholds: [f64; 3],
    },
}

/// Destination for journal entries. Implementations must tolerate
/// concurrent appends.
pub trait JournalSink: Send + Sync {
    fn append(&self, entry: &JournalEntry);
}

/// Discards every entry.
pub struct NullJournal;

impl JournalSink for NullJournal {
    fn append(&self, _entry: &JournalEntry) {}
}

/// Emits each entry as a structured tracing event.
pub struct TracingJournal;

impl JournalSink for TracingJournal {
    fn append(&self, entry: &JournalEntry) {
        match serde_json::to_string(entry) {
            Ok(json) => info!(event = "journal.entry", entry = %json),
            Err(e) => info!(event = "journal.entry", error = %e, "unserializable entry"),
        }
    }
}

/// Collects entries in memory (testing and the CLI's --json report).
#[derive(Default)]
pub struct MemoryJournal {
    entries: Mutex<Vec<JournalEntry>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.lock().expect("journal poisoned").clone()
    }
}

impl JournalSink for MemoryJournal {
    fn append(&self, entry: &JournalEntry) {
        self.entries.lock().expect("journal poisoned").push(entry.clone());
    }
}

// ---------------------------------------------------------------------------
// Calibration artifacts
// ---------------------------------------------------------------------------

/// Auditable snapshot of a calibration state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationArtifact {
    pub state: CalibrationState,
    pub written_at: DateTime<Utc>,
}

fn digest_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Persist `<dir>/v<version>/calibration.json` and
/// `<dir>/v<version>/calibration.digest`.
pub fn write_calibration_artifact(state: &CalibrationState, dir: &Path) -> Result<PathBuf> {
    let artifact = CalibrationArtifact {
        state: state.clone(),
        written_at: Utc::now(),
    };
    let version_dir = dir.join(format!("v{}", state.version));
    std::fs::create_dir_all(&version_dir)?;

    let path = version_dir.join("calibration.json");
    let digest_path = version_dir.join("calibration.digest");
    let json = serde_json::to_vec_pretty(&artifact)?;
    let digest = digest_hex(&json);

    std::fs::write(&path, &json)?;
    std::fs::write(&digest_path, digest.as_bytes())?;

    Ok(path)
}

/// Read and verify `<dir>/v<version>/calibration.json` integrity.
pub fn read_calibration_artifact(version: u32, dir: &Path) -> Result<CalibrationArtifact> {
    let version_dir = dir.join(format!("v{version}"));
    let path = version_dir.join("calibration.json");
    let digest_path = version_dir.join("calibration.digest");

    let json = std::fs::read(&path)?;
    let digest = std::fs::read_to_string(&digest_path)?;
    let actual = digest_hex(&json);
    if digest.trim() != actual {
        return Err(CrucibleError::DigestMismatch {
            expected: digest.trim().to_string(),
            actual,
        });
    }

    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrucibleConfig;

    #[test]
    fn test_memory_journal_collects_entries() {
        let journal = MemoryJournal::new();
        journal.append(&JournalEntry::ClarificationRequested {
            request_id: Uuid::new_v4(),
        });
        journal.append(&JournalEntry::CalibrationApplied {
            version: 2,
            thresholds: [2.5, 5.5, 8.0],
        });
        assert_eq!(journal.entries().len(), 2);
    }

    #[test]
    fn test_entry_serde_roundtrip() {
        let entry = JournalEntry::LoopCompleted {
            request_id: Uuid::new_v4(),
            tier: Tier::Full,
            iterations: 3,
            converged: false,
            termination: Termination::BudgetExhausted { reason: None },
            composite: 7.2,
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: JournalEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }

    #[test]
    fn test_artifact_roundtrip_with_digest() {
        let dir = tempfile::tempdir().unwrap();
        let state = CalibrationState::initial(&CrucibleConfig::default());

        write_calibration_artifact(&state, dir.path()).unwrap();
        let artifact = read_calibration_artifact(1, dir.path()).unwrap();
        assert_eq!(artifact.state, state);
    }

    #[test]
    fn test_tampered_artifact_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = CalibrationState::initial(&CrucibleConfig::default());
        let path = write_calibration_artifact(&state, dir.path()).unwrap();

        let mut json = std::fs::read_to_string(&path).unwrap();
        json = json.replace("\"version\": 1", "\"version\": 9");
        std::fs::write(&path, json).unwrap();

        let err = read_calibration_artifact(1, dir.path()).unwrap_err();
        assert!(matches!(err, CrucibleError::DigestMismatch { .. }));
    }
}

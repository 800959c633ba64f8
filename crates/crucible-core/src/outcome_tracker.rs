//! Append-only log of triage decisions and their observed correctness.

use std::sync::Mutex;

use chrono::Utc;
use tracing::debug;

use crate::domain::{OutcomeRecord, OutcomeSignal, TriageDecision};

/// Default trailing window for accuracy queries.
pub const DEFAULT_ACCURACY_WINDOW: usize = 50;

struct TrackerInner {
    records: Vec<OutcomeRecord>,
    next_seq: u64,
    since_calibration: usize,
}

/// Records each triage decision with its eventual correctness signal.
///
/// Appends are safe under concurrent writers: a mutex guards the log and
/// assigns a monotonic sequence per record. The log is append-only —
/// nothing ever rewrites or removes an entry.
pub struct OutcomeTracker {
    inner: Mutex<TrackerInner>,
}

impl OutcomeTracker {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TrackerInner {
                records: Vec::new(),
                next_seq: 0,
                since_calibration: 0,
            }),
        }
    }

    /// Append a decision with its signal, returning the stored record.
    pub fn record(&self, decision: TriageDecision, signal: OutcomeSignal) -> OutcomeRecord {
        let mut inner = self.inner.lock().expect("outcome log poisoned");
        let record = OutcomeRecord {
            seq: inner.next_seq,
            decision,
            signal,
            recorded_at: Utc::now(),
        };
        inner.next_seq += 1;
        inner.since_calibration += 1;
        inner.records.push(record.clone());
        debug!(seq = record.seq, signal = %signal, "outcome recorded");
        record
    }

    /// The most recent `n` records, oldest first.
    pub fn recent(&self, n: usize) -> Vec<OutcomeRecord> {
        let inner = self.inner.lock().expect("outcome log poisoned");
        let start = inner.records.len().saturating_sub(n);
        inner.records[start..].to_vec()
    }

    /// Accuracy over the trailing `window` records:
    /// correct / (correct + over + under). Unknown signals carry no
    /// evidence and are excluded; a window with no resolved signals
    /// reports 1.0.
    pub fn accuracy(&self, window: usize) -> f64 {
        accuracy_of(&self.recent(window))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("outcome log poisoned").records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Outcomes appended since the last calibration pass.
    pub fn samples_since_calibration(&self) -> usize {
        self.inner.lock().expect("outcome log poisoned").since_calibration
    }

    /// Called by the calibrator after each pass, whether or not it
    /// adjusted anything — at most one pass per window.
    pub fn reset_calibration_counter(&self) {
        self.inner.lock().expect("outcome log poisoned").since_calibration = 0;
    }
}

impl Default for OutcomeTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Accuracy over a slice of records; shared with the calibrator so both
/// always agree on the definition.
pub fn accuracy_of(records: &[OutcomeRecord]) -> f64 {
    let mut correct = 0usize;
    let mut misclassified = 0usize;
    for record in records {
        match record.signal {
            OutcomeSignal::Correct => correct += 1,
            OutcomeSignal::OverApplied | OutcomeSignal::UnderApplied => misclassified += 1,
            OutcomeSignal::Unknown => {}
        }
    }
    let resolved = correct + misclassified;
    if resolved == 0 {
        return 1.0;
    }
    correct as f64 / resolved as f64
}

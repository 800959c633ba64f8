//! Calibration state and its read-copy-update store.
//!
//! `CalibrationState` is the only shared mutable resource in the engine.
//! Readers take `Arc` snapshots (copy-on-read); the calibrator computes a
//! replacement off to the side and swaps the reference atomically, so an
//! in-flight triage decision holding the old snapshot is never affected
//! by a concurrent calibration pass. Every candidate state is validated
//! before the swap — an invalid proposal is rejected and the prior state
//! retained.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CrucibleConfig;
use crate::domain::{CrucibleError, Factor, Result};

/// Triage weights and tier thresholds, versioned per calibration pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationState {
    /// Incremented on every applied calibration; stamped onto each
    /// triage decision as `weights_version`.
    pub version: u32,
    pub weights: BTreeMap<Factor, f64>,
    /// `[t1, t2, t3]` — strictly increasing tier cut points.
    pub thresholds: [f64; 3],
    pub last_calibrated_at: Option<DateTime<Utc>>,
}

impl CalibrationState {
    /// Initial state from configuration, version 1.
    pub fn initial(config: &CrucibleConfig) -> Self {
        let mut weights = config.initial_weights.clone();
        for factor in Factor::ALL {
            weights.entry(factor).or_insert(1.0);
        }
        Self {
            version: 1,
            weights,
            thresholds: config.initial_thresholds,
            last_calibrated_at: None,
        }
    }

    /// Reject states that would break the tier partition or the weight
    /// bounds.
    pub fn validate(&self) -> Result<()> {
        let [t1, t2, t3] = self.thresholds;
        if !(t1 < t2 && t2 < t3) {
            return Err(CrucibleError::Calibration(format!(
                "thresholds must be strictly increasing, got [{t1}, {t2}, {t3}]"
            )));
        }
        let (lo, hi) = CrucibleConfig::WEIGHT_RANGE;
        for factor in Factor::ALL {
            let w = self.weights.get(&factor).copied().unwrap_or(1.0);
            if !(lo..=hi).contains(&w) || !w.is_finite() {
                return Err(CrucibleError::Calibration(format!(
                    "weight for {factor} out of range [{lo}, {hi}]: {w}"
                )));
            }
        }
        Ok(())
    }

    pub fn weight(&self, factor: Factor) -> f64 {
        self.weights.get(&factor).copied().unwrap_or(1.0)
    }
}

/// Read-copy-update holder for the active [`CalibrationState`].
///
/// The lock is held only for the pointer read or swap, never across an
/// await point.
pub struct CalibrationStore {
    current: RwLock<Arc<CalibrationState>>,
}

impl CalibrationStore {
    /// Validates and installs the initial state.
    pub fn new(initial: CalibrationState) -> Result<Self> {
        initial.validate()?;
        Ok(Self {
            current: RwLock::new(Arc::new(initial)),
        })
    }

    /// Immutable snapshot of the active state.
    pub fn snapshot(&self) -> Arc<CalibrationState> {
        Arc::clone(&self.current.read().expect("calibration lock poisoned"))
    }

    /// Validate `next` and atomically swap it in, returning the new
    /// snapshot. On validation failure the active state is untouched.
    pub fn swap(&self, next: CalibrationState) -> Result<Arc<CalibrationState>> {
        next.validate()?;
        let next = Arc::new(next);
        let mut current = self.current.write().expect("calibration lock poisoned");
        *current = Arc::clone(&next);
        Ok(next)
    }
}

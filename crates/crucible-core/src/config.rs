//! Engine configuration: indicator patterns, initial calibration values,
//! and budgets.
//!
//! The configuration is fully serializable so deployments can load it
//! from a file, and validated once at startup — an invalid configuration
//! is a fatal [`CrucibleError::Config`], never a silent fallback.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{CrucibleError, Factor, FactorLevel, Result};

/// One indicator: when `pattern` matches the request text, `factor`
/// is a candidate for `level`.
///
/// Patterns are case-insensitive regular expressions. A `None`-level
/// rule is an explicit lightweight marker ("quick question") that pins
/// the factor at zero even when stronger indicators also match, because
/// ties always resolve toward the lower level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorRule {
    pub factor: Factor,
    pub level: FactorLevel,
    pub pattern: String,
}

impl IndicatorRule {
    pub fn new(factor: Factor, level: FactorLevel, pattern: impl Into<String>) -> Self {
        Self {
            factor,
            level,
            pattern: pattern.into(),
        }
    }

    /// Compile the pattern, case-insensitive.
    pub fn compile(&self) -> Result<Regex> {
        Regex::new(&format!("(?i){}", self.pattern)).map_err(|e| {
            CrucibleError::Config(format!(
                "invalid indicator pattern for {}: {e}",
                self.factor
            ))
        })
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrucibleConfig {
    /// Declared quality dimensions. Every name must have a registered
    /// scorer at build time.
    pub dimensions: Vec<String>,

    /// Initial per-factor triage weights, adjusted by calibration.
    pub initial_weights: BTreeMap<Factor, f64>,

    /// Initial tier thresholds `[t1, t2, t3]`: scores below t1 skip,
    /// below t2 go light, below t3 go full, the rest go deep.
    pub initial_thresholds: [f64; 3],

    /// Outcomes per calibration window.
    pub calibration_window: usize,

    /// Windowed accuracy below which calibration adjusts parameters.
    pub accuracy_target: f64,

    /// Bounded per-pass weight adjustment.
    pub weight_step: f64,

    /// Bounded per-pass threshold adjustment.
    pub threshold_step: f64,

    /// Bounded wait for one evolver call; a timeout counts as a failed
    /// attempt toward the retry-once policy.
    pub evolver_wait_ms: u64,

    /// Indicator rules for the factor scorer.
    pub indicators: Vec<IndicatorRule>,
}

impl CrucibleConfig {
    /// Valid weight range for any triage factor.
    pub const WEIGHT_RANGE: (f64, f64) = (0.1, 1.0);

    /// The built-in quality dimensions used when the caller does not
    /// declare their own.
    pub fn default_dimensions() -> Vec<String> {
        ["clarity", "completeness", "specificity", "structure", "actionability"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn default_indicators() -> Vec<IndicatorRule> {
        use Factor::*;
        use FactorLevel::{None, Strong, Weak};
        vec![
            IndicatorRule::new(Complexity, Strong, r"\b(design|architect|strateg)"),
            IndicatorRule::new(Complexity, Weak, r"\b(implement|refactor|trade-?off|how should)"),
            IndicatorRule::new(Complexity, None, r"\b(quick question|trivial|typo)\b"),
            IndicatorRule::new(Stakes, Strong, r"\b(high-?stakes|production|security|irreversible|data loss)\b"),
            IndicatorRule::new(Stakes, Weak, r"\b(important|customer|deadline)\b"),
            IndicatorRule::new(Stakes, None, r"\b(throwaway|scratch|just curious)\b"),
            IndicatorRule::new(Novelty, Strong, r"\b(unprecedented|greenfield|first time|never (seen|done))\b"),
            IndicatorRule::new(Novelty, Weak, r"\b(novel|unfamiliar|new (domain|area|territory))\b"),
            IndicatorRule::new(UserSignal, Strong, r"\b(best approach|be thorough|take your time|double-?check)\b"),
            IndicatorRule::new(UserSignal, Weak, r"\b(review this|careful)\b"),
            IndicatorRule::new(UserSignal, None, r"\b(quick|rough|just a draft)\b"),
            IndicatorRule::new(Ambiguity, Strong, r"\b(not sure what|no idea|somehow|something like|unclear)\b"),
            IndicatorRule::new(Ambiguity, Weak, r"\b(maybe|roughly|approximately|sort of)\b"),
            IndicatorRule::new(Ambiguity, None, r"\b(specifically|exactly|precisely|clear)\b"),
        ]
    }

    /// Validate the configuration. Called once by the engine builder.
    pub fn validate(&self) -> Result<()> {
        if self.dimensions.is_empty() {
            return Err(CrucibleError::Config(
                "at least one quality dimension must be declared".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for dim in &self.dimensions {
            if !seen.insert(dim.as_str()) {
                return Err(CrucibleError::Config(format!(
                    "duplicate dimension declared: {dim}"
                )));
            }
        }

        let [t1, t2, t3] = self.initial_thresholds;
        if !(t1 < t2 && t2 < t3) {
            return Err(CrucibleError::Config(format!(
                "thresholds must be strictly increasing, got [{t1}, {t2}, {t3}]"
            )));
        }

        let (lo, hi) = Self::WEIGHT_RANGE;
        for factor in Factor::ALL {
            let w = self.initial_weights.get(&factor).copied().unwrap_or(1.0);
            if !(lo..=hi).contains(&w) {
                return Err(CrucibleError::Config(format!(
                    "weight for {factor} out of range [{lo}, {hi}]: {w}"
                )));
            }
        }

        if self.calibration_window == 0 {
            return Err(CrucibleError::Config(
                "calibration window must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.accuracy_target) {
            return Err(CrucibleError::Config(format!(
                "accuracy target out of range [0, 1]: {}",
                self.accuracy_target
            )));
        }
        if self.weight_step <= 0.0 || self.threshold_step <= 0.0 {
            return Err(CrucibleError::Config(
                "calibration steps must be positive".to_string(),
            ));
        }
        if self.evolver_wait_ms == 0 {
            return Err(CrucibleError::Config(
                "evolver wait must be positive".to_string(),
            ));
        }

        for rule in &self.indicators {
            rule.compile()?;
        }

        Ok(())
    }
}

impl Default for CrucibleConfig {
    fn default() -> Self {
        Self {
            dimensions: Self::default_dimensions(),
            initial_weights: Factor::ALL.iter().map(|f| (*f, 1.0)).collect(),
            initial_thresholds: [2.5, 5.5, 7.5],
            calibration_window: 50,
            accuracy_target: 0.80,
            weight_step: 0.05,
            threshold_step: 0.5,
            evolver_wait_ms: 30_000,
            indicators: Self::default_indicators(),
        }
    }
}

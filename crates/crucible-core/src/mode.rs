//! Operating modes and the parameter table they resolve to.
//!
//! Modes only ever adjust thresholds, budgets, and verbosity — never the
//! algorithmic steps themselves — so the whole surface is one pure
//! lookup table. The active mode is snapshotted once at request entry;
//! a concurrent `set_mode` never affects an in-flight request.

use serde::{Deserialize, Serialize};

use crate::domain::Tier;

/// Process-wide operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Validate quietly; report only final results.
    Silent,
    /// Validate and narrate each decision.
    Transparent,
    /// Validate and surface intermediate candidates for discussion.
    Collaborative,
    /// Bypass validation entirely — every request is answered directly.
    Raw,
    /// Demand more: higher pass bar, higher full/deep cut point.
    Aggressive,
    /// Demand less: lower pass bar, lower full/deep cut point.
    Permissive,
}

impl Default for Mode {
    fn default() -> Self {
        Self::Transparent
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Silent => write!(f, "silent"),
            Self::Transparent => write!(f, "transparent"),
            Self::Collaborative => write!(f, "collaborative"),
            Self::Raw => write!(f, "raw"),
            Self::Aggressive => write!(f, "aggressive"),
            Self::Permissive => write!(f, "permissive"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "silent" => Ok(Self::Silent),
            "transparent" => Ok(Self::Transparent),
            "collaborative" => Ok(Self::Collaborative),
            "raw" => Ok(Self::Raw),
            "aggressive" => Ok(Self::Aggressive),
            "permissive" => Ok(Self::Permissive),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Parameter overrides resolved from a mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeParameters {
    /// Composite score a candidate must reach to converge (0–10).
    pub pass_bar: f64,
    /// Scales each tier's base iteration budget.
    pub max_iterations_multiplier: f64,
    /// Shift applied to the full/deep cut point (t3) before tier lookup.
    pub tier_threshold_shift: f64,
    /// 0 = results only, 1 = decisions, 2 = intermediate candidates.
    pub verbosity: u8,
}

impl ModeParameters {
    /// Effective iteration budget for a tier under this mode.
    pub fn max_iterations(&self, tier: Tier) -> u32 {
        let scaled = f64::from(tier.base_max_iterations()) * self.max_iterations_multiplier;
        scaled.round().max(0.0) as u32
    }
}

/// Pure mode → parameters lookup.
pub struct ModeController;

impl ModeController {
    pub fn parameters(mode: Mode) -> ModeParameters {
        match mode {
            Mode::Silent => ModeParameters {
                pass_bar: 8.0,
                max_iterations_multiplier: 1.0,
                tier_threshold_shift: 0.0,
                verbosity: 0,
            },
            Mode::Transparent => ModeParameters {
                pass_bar: 8.0,
                max_iterations_multiplier: 1.0,
                tier_threshold_shift: 0.0,
                verbosity: 1,
            },
            Mode::Collaborative => ModeParameters {
                pass_bar: 8.0,
                max_iterations_multiplier: 1.0,
                tier_threshold_shift: 0.0,
                verbosity: 2,
            },
            // Raw skips validation at the gate; the parameters are the
            // defaults so anything that does consult them stays sane.
            Mode::Raw => ModeParameters {
                pass_bar: 8.0,
                max_iterations_multiplier: 1.0,
                tier_threshold_shift: 0.0,
                verbosity: 0,
            },
            Mode::Aggressive => ModeParameters {
                pass_bar: 9.0,
                max_iterations_multiplier: 1.0,
                tier_threshold_shift: 1.0,
                verbosity: 1,
            },
            Mode::Permissive => ModeParameters {
                pass_bar: 6.0,
                max_iterations_multiplier: 1.0,
                tier_threshold_shift: -1.0,
                verbosity: 1,
            },
        }
    }
}

//! Layer-0 triage factors and their scores.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The five triage inputs scored for every incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    /// How much reasoning the request demands.
    Complexity,
    /// Cost of getting the answer wrong.
    Stakes,
    /// How far outside known territory the request sits.
    Novelty,
    /// Explicit caller cues about desired rigor.
    UserSignal,
    /// How underspecified the request is.
    Ambiguity,
}

impl Factor {
    /// All factors in canonical order.
    pub const ALL: [Factor; 5] = [
        Factor::Complexity,
        Factor::Stakes,
        Factor::Novelty,
        Factor::UserSignal,
        Factor::Ambiguity,
    ];
}

impl std::fmt::Display for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Complexity => write!(f, "complexity"),
            Self::Stakes => write!(f, "stakes"),
            Self::Novelty => write!(f, "novelty"),
            Self::UserSignal => write!(f, "user_signal"),
            Self::Ambiguity => write!(f, "ambiguity"),
        }
    }
}

/// Strength of one factor: 0, 1, or 2 points.
///
/// When indicators at different levels match the same factor, the lower
/// level wins — under-validating is cheaper to recover from than
/// over-validating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorLevel {
    None,
    Weak,
    Strong,
}

impl FactorLevel {
    /// Point value contributed to the triage total.
    pub fn points(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Weak => 1,
            Self::Strong => 2,
        }
    }

    pub fn from_points(points: u8) -> Option<Self> {
        match points {
            0 => Some(Self::None),
            1 => Some(Self::Weak),
            2 => Some(Self::Strong),
            _ => None,
        }
    }
}

impl Default for FactorLevel {
    fn default() -> Self {
        Self::None
    }
}

/// Scores for all five factors, derived once per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorScores {
    pub complexity: FactorLevel,
    pub stakes: FactorLevel,
    pub novelty: FactorLevel,
    pub user_signal: FactorLevel,
    pub ambiguity: FactorLevel,
}

impl FactorScores {
    pub fn get(&self, factor: Factor) -> FactorLevel {
        match factor {
            Factor::Complexity => self.complexity,
            Factor::Stakes => self.stakes,
            Factor::Novelty => self.novelty,
            Factor::UserSignal => self.user_signal,
            Factor::Ambiguity => self.ambiguity,
        }
    }

    pub fn set(&mut self, factor: Factor, level: FactorLevel) {
        match factor {
            Factor::Complexity => self.complexity = level,
            Factor::Stakes => self.stakes = level,
            Factor::Novelty => self.novelty = level,
            Factor::UserSignal => self.user_signal = level,
            Factor::Ambiguity => self.ambiguity = level,
        }
    }

    /// Iterate factors with their levels in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Factor, FactorLevel)> + '_ {
        Factor::ALL.iter().map(move |f| (*f, self.get(*f)))
    }

    /// Weighted point total. Weights default to 1.0 for factors missing
    /// from the map.
    pub fn weighted_total(&self, weights: &BTreeMap<Factor, f64>) -> f64 {
        self.iter()
            .map(|(factor, level)| {
                let w = weights.get(&factor).copied().unwrap_or(1.0);
                w * f64::from(level.points())
            })
            .sum()
    }

    /// True when every factor scored zero.
    pub fn all_zero(&self) -> bool {
        self.iter().all(|(_, level)| level == FactorLevel::None)
    }
}

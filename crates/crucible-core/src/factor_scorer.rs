//! Layer-0 factor scoring from indicator patterns.
//!
//! Each factor resolves independently: every configured indicator whose
//! pattern matches the request text nominates its level, and the lowest
//! nominated level wins. No match at all scores zero. The bias toward
//! lower levels keeps borderline requests in the skip/light tiers —
//! under-validating is cheaper to recover from than over-validating.

use regex::Regex;
use tracing::debug;

use crate::config::IndicatorRule;
use crate::domain::{Factor, FactorLevel, FactorScores, Request, Result};
use crate::mode::Mode;

/// Outcome of factor scoring: either a full score set, or a demand for
/// clarification when the request is pure ambiguity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactorOutcome {
    Scored(FactorScores),
    /// Ambiguity would score 2 while every other factor is 0 — there is
    /// nothing to validate yet. The caller must ask a clarifying
    /// question instead of entering the triage gate.
    Clarify,
}

struct CompiledRule {
    factor: Factor,
    level: FactorLevel,
    regex: Regex,
}

/// Computes the five triage factors for an incoming request.
///
/// Stateless after construction; safe to call concurrently.
pub struct FactorScorer {
    rules: Vec<CompiledRule>,
}

impl FactorScorer {
    /// Compile the configured indicator rules. Invalid patterns are a
    /// fatal configuration error.
    pub fn new(rules: &[IndicatorRule]) -> Result<Self> {
        let compiled = rules
            .iter()
            .map(|rule| {
                Ok(CompiledRule {
                    factor: rule.factor,
                    level: rule.level,
                    regex: rule.compile()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules: compiled })
    }

    /// Score `request`, matching indicators against payload and declared
    /// tags.
    ///
    /// In [`Mode::Raw`] the clarify short-circuit is suppressed: the
    /// gate will skip the request regardless, so there is no point
    /// interrogating the caller first.
    pub fn score(&self, request: &Request, mode: Mode) -> FactorOutcome {
        let text = request.indicator_text();
        let mut scores = FactorScores::default();

        for factor in Factor::ALL {
            let level = self.resolve_factor(factor, &text);
            scores.set(factor, level);
        }

        debug!(
            request_id = %request.id,
            complexity = scores.complexity.points(),
            stakes = scores.stakes.points(),
            novelty = scores.novelty.points(),
            user_signal = scores.user_signal.points(),
            ambiguity = scores.ambiguity.points(),
            "factors scored"
        );

        let only_ambiguous = scores.ambiguity == FactorLevel::Strong
            && Factor::ALL
                .iter()
                .filter(|f| **f != Factor::Ambiguity)
                .all(|f| scores.get(*f) == FactorLevel::None);

        if only_ambiguous && mode != Mode::Raw {
            return FactorOutcome::Clarify;
        }

        FactorOutcome::Scored(scores)
    }

    /// Lowest level among matching indicators for `factor`, or zero when
    /// nothing matches.
    fn resolve_factor(&self, factor: Factor, text: &str) -> FactorLevel {
        self.rules
            .iter()
            .filter(|rule| rule.factor == factor && rule.regex.is_match(text))
            .map(|rule| rule.level)
            .min()
            .unwrap_or(FactorLevel::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrucibleConfig;
    use crate::domain::RequestContext;

    fn scorer() -> FactorScorer {
        FactorScorer::new(&CrucibleConfig::default().indicators).unwrap()
    }

    fn scored(outcome: FactorOutcome) -> FactorScores {
        match outcome {
            FactorOutcome::Scored(scores) => scores,
            FactorOutcome::Clarify => panic!("expected scores, got clarify"),
        }
    }

    #[test]
    fn test_quick_question_scores_all_zero() {
        let request = Request::new("Quick question: what's 2+2?");
        let scores = scored(scorer().score(&request, Mode::Transparent));
        assert!(scores.all_zero());
    }

    #[test]
    fn test_strategic_request_scores_high() {
        let request = Request::new("Design the best approach for the rollout").with_context(
            RequestContext::default()
                .with_tag("strategic")
                .with_tag("high-stakes")
                .with_tag("novel-area")
                .with_tag("requirements are clear"),
        );
        let scores = scored(scorer().score(&request, Mode::Transparent));
        assert_eq!(scores.complexity, FactorLevel::Strong);
        assert_eq!(scores.stakes, FactorLevel::Strong);
        assert_eq!(scores.novelty, FactorLevel::Weak);
        assert_eq!(scores.user_signal, FactorLevel::Strong);
        assert_eq!(scores.ambiguity, FactorLevel::None);
    }

    #[test]
    fn test_ties_resolve_toward_lower_level() {
        // "quick question" pins complexity at zero even though "design"
        // also matches at the strong level.
        let request = Request::new("quick question about the design");
        let scores = scored(scorer().score(&request, Mode::Transparent));
        assert_eq!(scores.complexity, FactorLevel::None);
    }

    #[test]
    fn test_pure_ambiguity_demands_clarification() {
        let request = Request::new("I have no idea, do the thing");
        assert_eq!(scorer().score(&request, Mode::Transparent), FactorOutcome::Clarify);
    }

    #[test]
    fn test_ambiguity_with_other_signal_does_not_clarify() {
        let request = Request::new("no idea how to handle the production incident");
        let scores = scored(scorer().score(&request, Mode::Transparent));
        assert_eq!(scores.ambiguity, FactorLevel::Strong);
        assert_eq!(scores.stakes, FactorLevel::Strong);
    }

    #[test]
    fn test_raw_mode_suppresses_clarify() {
        let request = Request::new("I have no idea, do the thing");
        let scores = scored(scorer().score(&request, Mode::Raw));
        assert_eq!(scores.ambiguity, FactorLevel::Strong);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let request = Request::new("refactor the important customer flow");
        let first = scorer().score(&request, Mode::Transparent);
        let second = scorer().score(&request, Mode::Transparent);
        assert_eq!(first, second);
    }
}

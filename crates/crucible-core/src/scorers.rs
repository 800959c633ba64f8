//! Built-in heuristic text scorers for the five default dimensions.
//!
//! These are deliberately simple lexical heuristics — fast, pure, and
//! dependency-free — meant for the CLI and as reference implementations
//! of the [`DimensionScorer`] contract. Deployments scoring code or
//! architecture register their own scorers instead.

use crate::dimensions::{DimensionScorer, ScoringContext};
use crate::domain::{Candidate, DimensionScore, Result};

const HEDGES: [&str; 8] = [
    "maybe",
    "probably",
    "somehow",
    "sort of",
    "kind of",
    "i think",
    "possibly",
    "perhaps",
];

const VAGUE: [&str; 6] = ["thing", "stuff", "various", "several", "some way", "etc"];

const ACTION_VERBS: [&str; 10] = [
    "run", "add", "use", "set", "create", "check", "replace", "remove", "measure", "verify",
];

fn count_matches(text: &str, needles: &[&str]) -> usize {
    let lower = text.to_lowercase();
    needles.iter().filter(|n| lower.contains(*n)).count()
}

fn sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Penalizes hedging language and run-on sentences.
pub struct ClarityScorer;

impl DimensionScorer for ClarityScorer {
    fn dimension(&self) -> &str {
        "clarity"
    }

    fn score(&self, candidate: &Candidate, _ctx: &ScoringContext) -> Result<DimensionScore> {
        let hedges = count_matches(&candidate.content, &HEDGES);
        let long_sentences = sentences(&candidate.content)
            .iter()
            .filter(|s| s.split_whitespace().count() > 30)
            .count();

        let value = 10.0 - 1.5 * hedges as f64 - long_sentences as f64;
        let rationale = if hedges == 0 && long_sentences == 0 {
            "direct language, readable sentence length".to_string()
        } else {
            format!("{hedges} hedging phrase(s), {long_sentences} run-on sentence(s)")
        };
        Ok(DimensionScore::new(value, rationale))
    }
}

/// Rewards substance proportional to the request and penalizes
/// unfinished markers.
pub struct CompletenessScorer;

impl DimensionScorer for CompletenessScorer {
    fn dimension(&self) -> &str {
        "completeness"
    }

    fn score(&self, candidate: &Candidate, ctx: &ScoringContext) -> Result<DimensionScore> {
        let words = candidate.content.split_whitespace().count();
        let request_words = ctx.payload.split_whitespace().count().max(1);
        let unfinished = count_matches(&candidate.content, &["todo", "tbd", "..."]);

        // A candidate shorter than its request rarely answers it.
        let coverage = (words as f64 / request_words as f64).min(3.0);
        let value = 4.0 + 2.0 * coverage - 2.0 * unfinished as f64;
        let rationale = format!("{words} words for a {request_words}-word request, {unfinished} unfinished marker(s)");
        Ok(DimensionScore::new(value, rationale))
    }
}

/// Rewards concrete detail (numbers, examples) over vague filler.
pub struct SpecificityScorer;

impl DimensionScorer for SpecificityScorer {
    fn dimension(&self) -> &str {
        "specificity"
    }

    fn score(&self, candidate: &Candidate, _ctx: &ScoringContext) -> Result<DimensionScore> {
        let digits = candidate.content.chars().filter(|c| c.is_ascii_digit()).count();
        let examples = count_matches(&candidate.content, &["for example", "e.g.", "such as"]);
        let vague = count_matches(&candidate.content, &VAGUE);

        let value = 5.0 + (digits.min(10) as f64) * 0.3 + 1.5 * examples as f64 - 1.5 * vague as f64;
        let rationale = format!("{digits} digit(s), {examples} example marker(s), {vague} vague term(s)");
        Ok(DimensionScore::new(value, rationale))
    }
}

/// Rewards visible organization once content is long enough to need it.
pub struct StructureScorer;

impl DimensionScorer for StructureScorer {
    fn dimension(&self) -> &str {
        "structure"
    }

    fn score(&self, candidate: &Candidate, _ctx: &ScoringContext) -> Result<DimensionScore> {
        let words = candidate.content.split_whitespace().count();
        let lines = candidate.content.lines().count();
        let list_items = candidate
            .content
            .lines()
            .filter(|l| {
                let t = l.trim_start();
                t.starts_with('-') || t.starts_with('*') || t.chars().next().is_some_and(|c| c.is_ascii_digit())
            })
            .count();

        let value = if words <= 60 {
            // Short answers don't need scaffolding.
            8.0
        } else if list_items >= 2 || lines >= 4 {
            9.0
        } else {
            5.0
        };
        let rationale = format!("{words} words across {lines} line(s), {list_items} list item(s)");
        Ok(DimensionScore::new(value, rationale))
    }
}

/// Rewards concrete next steps over passive observations.
pub struct ActionabilityScorer;

impl DimensionScorer for ActionabilityScorer {
    fn dimension(&self) -> &str {
        "actionability"
    }

    fn score(&self, candidate: &Candidate, _ctx: &ScoringContext) -> Result<DimensionScore> {
        let verbs = count_matches(&candidate.content, &ACTION_VERBS);
        let passive = count_matches(
            &candidate.content,
            &["should be considered", "could be explored", "one might"],
        );

        let value = 5.0 + 1.5 * verbs.min(4) as f64 - 2.0 * passive as f64;
        let rationale = format!("{verbs} action verb(s), {passive} passive suggestion(s)");
        Ok(DimensionScore::new(value, rationale))
    }
}

/// The full default scorer set, matching
/// [`CrucibleConfig::default_dimensions`](crate::config::CrucibleConfig::default_dimensions).
pub fn default_scorers() -> Vec<std::sync::Arc<dyn DimensionScorer>> {
    vec![
        std::sync::Arc::new(ClarityScorer),
        std::sync::Arc::new(CompletenessScorer),
        std::sync::Arc::new(SpecificityScorer),
        std::sync::Arc::new(StructureScorer),
        std::sync::Arc::new(ActionabilityScorer),
    ]
}

use std::sync::Arc;

use crucible_core::fakes::{CountingEvolver, FailingEvolver, ScriptedScorer};
use crucible_core::{
    CrucibleConfig, CrucibleEngine, Evaluation, EvaluationReport, JournalEntry, MemoryJournal,
    Mode, Request, RequestContext, Termination, Tier,
};

fn strategic_request() -> Request {
    Request::new("Design the best approach for the rollout").with_context(
        RequestContext::default()
            .with_tag("strategic")
            .with_tag("high-stakes")
            .with_tag("novel-area")
            .with_tag("requirements are clear"),
    )
}

fn engine_with(
    values: Vec<f64>,
    evolver: Arc<dyn crucible_core::Evolver>,
    journal: Arc<MemoryJournal>,
) -> CrucibleEngine {
    let config = CrucibleConfig {
        dimensions: vec!["quality".to_string()],
        ..Default::default()
    };
    CrucibleEngine::builder()
        .with_config(config)
        .register_scorer(Arc::new(ScriptedScorer::new("quality", values)))
        .with_evolver(evolver)
        .with_journal(journal)
        .build()
        .expect("engine builds")
}

fn completed(evaluation: Evaluation) -> EvaluationReport {
    match evaluation {
        Evaluation::Completed(report) => report,
        other => panic!("expected completed evaluation, got {other:?}"),
    }
}

#[tokio::test]
async fn quick_question_skips_without_validation() {
    let evolver = Arc::new(CountingEvolver::new());
    let journal = Arc::new(MemoryJournal::new());
    let engine = engine_with(vec![9.0], evolver.clone(), journal.clone());

    let report = completed(engine.evaluate(&Request::new("Quick question: what's 2+2?")).await);

    assert!((report.decision.total_score - 0.0).abs() < f64::EPSILON);
    assert_eq!(report.decision.tier, Tier::Skip);
    assert!(report.candidate.is_none());
    assert!(report.converged.is_none());
    assert!(report.history.is_empty());
    assert_eq!(evolver.calls(), 0);

    // The journal saw the decision and nothing else.
    let entries = journal.entries();
    assert_eq!(entries.len(), 1);
    assert!(matches!(entries[0], JournalEntry::TriageDecided { .. }));
}

#[tokio::test]
async fn strategic_request_validates_in_full_tier() {
    let evolver = Arc::new(CountingEvolver::new());
    let journal = Arc::new(MemoryJournal::new());
    // Iteration 0 misses the bar, iteration 1 clears it.
    let engine = engine_with(vec![6.0, 9.0], evolver.clone(), journal.clone());

    let report = completed(engine.evaluate(&strategic_request()).await);

    assert!((report.decision.total_score - 7.0).abs() < f64::EPSILON);
    assert_eq!(report.decision.tier, Tier::Full);
    assert_eq!(report.converged, Some(true));
    assert_eq!(report.history.len(), 2);
    assert_eq!(report.termination, Some(Termination::Converged));

    let candidate = report.candidate.expect("validated candidate");
    assert_eq!(candidate.iteration, 1);
    assert!(candidate.composite >= 8.0);
    assert_eq!(evolver.calls(), 1);
}

#[tokio::test]
async fn full_tier_budget_is_three_iterations() {
    let evolver = Arc::new(CountingEvolver::new());
    let journal = Arc::new(MemoryJournal::new());
    // Never clears the bar; the loop must stop at the tier budget.
    let engine = engine_with(vec![5.0], evolver.clone(), journal.clone());

    let report = completed(engine.evaluate(&strategic_request()).await);

    assert_eq!(report.decision.tier, Tier::Full);
    assert_eq!(report.history.len(), 3);
    assert_eq!(report.converged, Some(false));
    assert_eq!(evolver.calls(), 2);
}

#[tokio::test]
async fn evolver_failure_returns_best_earlier_candidate() {
    // First evolve succeeds; the second fails both attempts.
    let evolver = Arc::new(FailingEvolver::new(1));
    let journal = Arc::new(MemoryJournal::new());
    let engine = engine_with(vec![6.0, 7.0], evolver.clone(), journal.clone());

    let report = completed(engine.evaluate(&strategic_request()).await);

    assert_eq!(report.converged, Some(false));
    let candidate = report.candidate.expect("best candidate");
    assert_eq!(candidate.iteration, 1);
    match report.termination {
        Some(Termination::BudgetExhausted { reason: Some(reason) }) => {
            assert!(reason.contains("evolver"));
        }
        other => panic!("expected budget exhaustion with reason, got {other:?}"),
    }
    assert_eq!(evolver.calls(), 3);
}

#[tokio::test]
async fn pure_ambiguity_short_circuits_to_clarification() {
    let evolver = Arc::new(CountingEvolver::new());
    let journal = Arc::new(MemoryJournal::new());
    let engine = engine_with(vec![9.0], evolver.clone(), journal.clone());

    let request = Request::new("I have no idea, do the thing");
    let evaluation = engine.evaluate(&request).await;

    assert!(matches!(evaluation, Evaluation::NeedsClarification { request_id } if request_id == request.id));
    assert_eq!(evolver.calls(), 0);

    let entries = journal.entries();
    assert_eq!(entries.len(), 1);
    assert!(matches!(entries[0], JournalEntry::ClarificationRequested { .. }));
    // No decision was issued, so there is nothing to report an outcome on.
}

#[tokio::test]
async fn raw_mode_skips_everything() {
    let evolver = Arc::new(CountingEvolver::new());
    let journal = Arc::new(MemoryJournal::new());
    let engine = engine_with(vec![9.0], evolver.clone(), journal.clone());
    engine.set_mode(Mode::Raw);

    let report = completed(engine.evaluate(&strategic_request()).await);
    assert_eq!(report.decision.tier, Tier::Skip);
    assert!(report.candidate.is_none());
    assert_eq!(evolver.calls(), 0);
}

#[tokio::test]
async fn permissive_mode_lowers_the_pass_bar() {
    let evolver = Arc::new(CountingEvolver::new());
    let journal = Arc::new(MemoryJournal::new());
    // 6.5 misses the default bar of 8 but clears the permissive bar of 6.
    let engine = engine_with(vec![6.5], evolver.clone(), journal.clone());
    engine.set_mode(Mode::Permissive);

    let report = completed(engine.evaluate(&strategic_request()).await);
    // Permissive also lowers the full/deep cut, so total 7 lands deep.
    assert_eq!(report.decision.tier, Tier::Deep);
    assert_eq!(report.converged, Some(true));
    assert_eq!(report.history.len(), 1);
    assert_eq!(evolver.calls(), 0);
}

#[tokio::test]
async fn mode_changes_apply_to_subsequent_requests_only() {
    let evolver = Arc::new(CountingEvolver::new());
    let journal = Arc::new(MemoryJournal::new());
    let engine = engine_with(vec![9.0], evolver.clone(), journal.clone());

    let before = completed(engine.evaluate(&strategic_request()).await);
    assert_eq!(before.decision.tier, Tier::Full);

    engine.set_mode(Mode::Raw);
    let after = completed(engine.evaluate(&strategic_request()).await);
    assert_eq!(after.decision.tier, Tier::Skip);
}

#[tokio::test]
async fn journal_records_the_full_lifecycle() {
    let evolver = Arc::new(CountingEvolver::new());
    let journal = Arc::new(MemoryJournal::new());
    let engine = engine_with(vec![9.0], evolver, journal.clone());

    let report = completed(engine.evaluate(&strategic_request()).await);
    engine
        .report_outcome(report.decision.id, crucible_core::OutcomeSignal::Correct)
        .expect("outcome accepted");

    let entries = journal.entries();
    assert!(entries
        .iter()
        .any(|e| matches!(e, JournalEntry::TriageDecided { .. })));
    assert!(entries
        .iter()
        .any(|e| matches!(e, JournalEntry::LoopCompleted { converged: true, .. })));
    assert!(entries
        .iter()
        .any(|e| matches!(e, JournalEntry::OutcomeRecorded { .. })));
}

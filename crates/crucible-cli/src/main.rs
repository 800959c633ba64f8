//! Crucible - triage and validation from the command line.
//!
//! ## Commands
//!
//! - `evaluate`: triage a request and, when warranted, run the full
//!   validation loop with the built-in heuristic scorers
//! - `triage`: factor scoring and tier preview only, no validation loop

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use crucible_core::{
    init_from_flags, CrucibleEngine, Evaluation, Mode, Request, RequestContext, RewriteEvolver,
    TracingJournal,
};

#[derive(Parser)]
#[command(name = "crucible")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Adaptive triage and validation engine", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a request end to end
    Evaluate {
        /// The request payload
        payload: String,

        /// Declared context tags (repeatable)
        #[arg(short, long)]
        tag: Vec<String>,

        /// Operating mode
        #[arg(short, long, default_value = "transparent")]
        mode: String,
    },

    /// Show factor scores and the tier the gate would pick
    Triage {
        /// The request payload
        payload: String,

        /// Declared context tags (repeatable)
        #[arg(short, long)]
        tag: Vec<String>,

        /// Operating mode
        #[arg(short, long, default_value = "transparent")]
        mode: String,
    },
}

#[derive(Serialize)]
struct TriagePreview {
    request_id: String,
    total_score: f64,
    tier: String,
    weights_version: u32,
}

fn build_request(payload: String, tags: Vec<String>) -> Request {
    let mut request = Request::new(payload);
    if !tags.is_empty() {
        let mut context = RequestContext::default();
        for tag in tags {
            context = context.with_tag(tag);
        }
        request = request.with_context(context);
    }
    request
}

fn build_engine(mode: Mode) -> Result<CrucibleEngine> {
    CrucibleEngine::builder()
        .with_scorers(crucible_core::default_scorers())
        .with_evolver(Arc::new(RewriteEvolver))
        .with_journal(Arc::new(TracingJournal))
        .with_mode(mode)
        .build()
        .context("engine construction failed")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_from_flags(cli.verbose, cli.json);

    match cli.command {
        Commands::Evaluate { payload, tag, mode } => {
            let mode: Mode = mode.parse().map_err(anyhow::Error::msg)?;
            let engine = build_engine(mode)?;
            let request = build_request(payload, tag);
            info!(request_id = %request.id, mode = %mode, "evaluating request");

            let evaluation = engine.evaluate(&request).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&evaluation)?);
                return Ok(());
            }

            match evaluation {
                Evaluation::NeedsClarification { .. } => {
                    println!("needs clarification: the request is too ambiguous to triage");
                    println!("restate what you are asking for, then resubmit");
                }
                Evaluation::Completed(report) => {
                    println!(
                        "tier: {} (score {}, weights v{})",
                        report.decision.tier, report.decision.total_score, report.decision.weights_version
                    );
                    match report.candidate {
                        None => println!("skipped: answer directly, no validation needed"),
                        Some(candidate) => {
                            println!(
                                "validated in {} iteration(s), composite {:.1}, converged: {}",
                                report.history.len(),
                                candidate.composite,
                                report.converged.unwrap_or(false)
                            );
                            for (name, score) in &candidate.dimension_scores {
                                println!("  {name}: {:.1} - {}", score.value, score.rationale);
                            }
                        }
                    }
                }
            }
        }

        Commands::Triage { payload, tag, mode } => {
            let mode: Mode = mode.parse().map_err(anyhow::Error::msg)?;
            let engine = build_engine(mode)?;
            let request = build_request(payload, tag);

            match engine.evaluate_triage_only(&request) {
                None => {
                    println!("needs clarification: the request is too ambiguous to triage");
                }
                Some(decision) => {
                    let preview = TriagePreview {
                        request_id: decision.request_id.to_string(),
                        total_score: decision.total_score,
                        tier: decision.tier.to_string(),
                        weights_version: decision.weights_version,
                    };
                    if cli.json {
                        println!("{}", serde_json::to_string_pretty(&preview)?);
                    } else {
                        println!("tier: {} (score {})", preview.tier, preview.total_score);
                        for (factor, level) in decision.factors.iter() {
                            println!("  {factor}: {}", level.points());
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

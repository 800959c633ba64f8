//! Centralised tracing initialisation for Crucible binaries.
//!
//! Call [`init_tracing`] once at program start. Safe to call more than
//! once — the global subscriber can only be set once per process, and
//! subsequent calls are silently ignored.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// * `json` — when `true`, emit newline-delimited JSON log lines.
/// * `level` — default verbosity when `RUST_LOG` is not set.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .try_init()
            .ok();
    }
}

/// Flag-level convenience for binaries: `--verbose` maps to DEBUG,
/// otherwise INFO.
pub fn init_from_flags(verbose: bool, json: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    init_tracing(json, level);
}

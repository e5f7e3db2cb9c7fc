use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber.
///
/// `log_level` is an [`EnvFilter`] directive (e.g. `"info"`, `"debug"`).
/// Falls back to `"info"` if the directive is not recognised.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer().with_target(false).with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .init();

    Ok(())
}

// ── Data-directory discovery ───────────────────────────────────────────────────

/// Attempt to locate the case-count data directory on the local system.
///
/// Checks the following paths in order and returns the first that exists:
/// 1. `~/.casewatch/data/`
/// 2. `./data/`
///
/// Returns `None` when neither path exists.
pub fn discover_data_dir() -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".casewatch").join("data"));
    }
    candidates.push(PathBuf::from("data"));
    candidates.into_iter().find(|p| p.is_dir())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

// File logging. The terminal belongs to the UI, so nothing is written to
// stdout or stderr while the app runs.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE: &str = "chronicle-explorer.log";

/// `RUST_LOG` wins over the configured level when set.
fn build_filter(level: &str, env_directives: Option<String>) -> Result<EnvFilter> {
    match env_directives.filter(|directives| !directives.trim().is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).context("Invalid RUST_LOG directives"),
        None => EnvFilter::try_new(level).context("Invalid log level in config"),
    }
}

/// Install the global subscriber. Keep the guard alive until exit so
/// buffered lines are flushed.
pub fn init(log_dir: &Path, level: &str) -> Result<WorkerGuard> {
    let filter = build_filter(level, std::env::var(EnvFilter::DEFAULT_ENV).ok())?;
    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    Ok(guard)
}

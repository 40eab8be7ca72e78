use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Log targets used across the workspace; everything else logs at `warn`.
const LOG_TARGETS: &[&str] = &["triage", "conversation", "support_api", "config", "widget"];

/// Installs a file logger so log lines never interleave with the REPL.
///
/// `RUST_LOG` wins over `verbose`. The returned guard flushes the writer on
/// drop and must live until exit.
pub fn init(logs_dir: &Path, verbose: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("failed to create log directory {}", logs_dir.display()))?;

    let appender = tracing_appender::rolling::daily(logs_dir, "triage.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut directives: Vec<String> = LOG_TARGETS
            .iter()
            .map(|target| format!("{target}={default_level}"))
            .collect();
        directives.push("warn".to_string());
        EnvFilter::new(directives.join(","))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(guard)
}

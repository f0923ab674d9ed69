//! Diagnostics: `tracing` output to a file beside the data.
//!
//! The terminal belongs to the menus, so nothing is written to stdout.
//! The filter comes from configuration only.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::TrackerConfig;

/// Install the global subscriber. Keep the guard alive until exit so
/// buffered lines are flushed.
pub fn init_tracing(config: &TrackerConfig) -> anyhow::Result<WorkerGuard> {
    let filter = EnvFilter::try_new(&config.logging.level)?;
    let appender = tracing_appender::rolling::never(
        &config.storage.data_dir,
        &config.logging.diagnostics_file,
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(guard)
}

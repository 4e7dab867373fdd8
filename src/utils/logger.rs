//! Process-wide tracing setup shared by the demo binaries and benches.

use std::env;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber for `tracing` events.
///
/// The level is read from the `LOGLEVEL` environment variable (`TRACE`,
/// `DEBUG`, `INFO`, `WARN`, `ERROR`) and defaults to `INFO`. A second call is
/// a no-op, so tests and binaries can both call it freely.
pub fn setup_logger() {
    let level = env::var("LOGLEVEL")
        .ok()
        .and_then(|raw| raw.parse::<Level>().ok())
        .unwrap_or(Level::INFO);

    let filter = EnvFilter::default().add_directive(level.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}

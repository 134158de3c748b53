//! Tracing setup for embedding applications.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! the embedder's call. `init_logging` wires the conventional fmt +
//! env-filter stack, and `file_writer` produces a non-blocking daily-rolling
//! file writer for long-lived services.

use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;

use crate::errors::{DomainError, Result};

/// Env var consulted for the default filter (`error`, `blockbind=debug`, ...).
pub const LOG_ENV_VAR: &str = "BLOCKBIND_LOG";

/// Install a global fmt subscriber filtered by `BLOCKBIND_LOG` (default
/// `info`).
///
/// # Errors
///
/// Returns `Internal` if a global subscriber is already installed.
pub fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| DomainError::Internal(format!("failed to install tracing subscriber: {e}")))
}

/// Non-blocking writer appending to `<dir>/blockbind.log`, rolled daily.
///
/// Keep the returned [`WorkerGuard`] alive for as long as logging should
/// flush; dropping it stops the background writer.
pub fn file_writer(dir: &Path) -> (NonBlocking, WorkerGuard) {
    let appender = tracing_appender::rolling::daily(dir, "blockbind.log");
    tracing_appender::non_blocking(appender)
}

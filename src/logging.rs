//! File logging
//!
//! The terminal belongs to the TUI, so `tracing` output goes to
//! `<cache_dir>/mpedit/mpedit.log` through a non-blocking writer. The filter
//! is read from `MPEDIT_LOG` (same syntax as `RUST_LOG`), defaulting to `info`.

use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "MPEDIT_LOG";
const LOG_FILE: &str = "mpedit.log";

/// Directory the log file is written to
pub fn log_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("mpedit")
}

/// Install the global subscriber.
///
/// Returns the writer guard, which must be held until exit so buffered lines
/// are flushed. `None` means logging is off (no writable log dir, or a
/// subscriber was already installed).
pub fn init() -> Option<WorkerGuard> {
    let dir = log_dir();
    if fs::create_dir_all(&dir).is_err() {
        return None;
    }

    let file_appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()
        .map(|_| guard)
}

//! Logging setup.
//!
//! The terminal belongs to the UI, so log events go to a file only:
//! - `logs/railpanel.log` by default, cleared on startup
//! - level controlled by `RUST_LOG` (defaults to `info`)

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Log file name inside the log directory.
pub const LOG_FILE: &str = "railpanel.log";

/// Keeps the background log writer alive; dropping it flushes the file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Install the global subscriber writing to `log_dir/railpanel.log`.
///
/// Creates the directory if needed and truncates the previous session's log.
pub fn init_logging(log_dir: &Path) -> Result<LoggingGuard, io::Error> {
    prepare_log_file(log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn prepare_log_file(log_dir: &Path) -> Result<(), io::Error> {
    fs::create_dir_all(log_dir)?;
    fs::write(log_dir.join(LOG_FILE), "")
}

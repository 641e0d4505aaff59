//! Tracing subscriber setup.

use std::fs::OpenOptions;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::{Config, LogFormat};
use crate::error::AppError;

/// Builds the level filter: `RUST_LOG` when set, otherwise the configured
/// level.
#[must_use]
pub fn env_filter(config: &Config) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Installs the global subscriber.
///
/// When a log file is configured, records are appended to it through a
/// non-blocking writer; the returned guard must be held until exit so
/// buffered records are flushed.
///
/// # Errors
///
/// Returns `AppError::Server` if the log file cannot be opened.
pub fn init(config: &Config) -> Result<Option<WorkerGuard>, AppError> {
    let (writer, guard) = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stdout), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(writer);
    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.with_ansi(guard.is_none()).init(),
    }
    Ok(guard)
}

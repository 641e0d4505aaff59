//! Trebek bot: startup and runtime errors.

use std::path::PathBuf;

use thiserror::Error;
use trebek_content::ContentError;
use trebek_core::error::DomainError;

/// Startup and runtime errors for the bot binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required setting is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The configuration file exists but could not be read.
    #[error("cannot read config file {path}: {source}")]
    ConfigFile {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The question file could not be opened.
    #[error(transparent)]
    Content(#[from] ContentError),

    /// A domain collaborator failed during shutdown.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// The TLS client could not be set up for the IRC server.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Network or log file I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

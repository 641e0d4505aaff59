//! Errors raised while opening question archives.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to open a question archive. Per-question failures after opening
/// are reported through `DomainError::Source` instead.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The archive could not be read.
    #[error("cannot read question archive {path}: {source}")]
    Io {
        /// Path of the archive.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The archive does not start with a JSON array.
    #[error("question archive {path} is not a JSON array")]
    NotAnArray {
        /// Path of the archive.
        path: PathBuf,
    },
}

//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A question source failed to produce or release a question.
    ///
    /// Source failures are transient from the engine's point of view: the
    /// current refill is abandoned and the next one retries.
    #[error("question source error: {0}")]
    Source(String),

    /// The score store could not load or persist its state.
    #[error("score store error: {0}")]
    Store(String),

    /// Outbound chat delivery failed.
    #[error("chat delivery error: {0}")]
    Chat(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),
}

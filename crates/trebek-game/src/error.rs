//! Round engine errors.

use thiserror::Error;
use uuid::Uuid;

/// Misuse of the round engine that callers must handle explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoundError {
    /// A round was started while another one was still active.
    #[error("round {round_id} is still active")]
    AlreadyActive {
        /// The round that is still running.
        round_id: Uuid,
    },
    /// The source still has questions but none could be fetched just now.
    #[error("no question ready, source will be retried")]
    NoQuestionReady,
}

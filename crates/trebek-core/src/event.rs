//! Round outcome events.

use serde::{Deserialize, Serialize};

/// How a round came to an end.
///
/// Delivered to the continuous-play scheduler after the round has been
/// cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    /// A player answered correctly before the timeout.
    Answered,
    /// The per-question timeout fired with the question still active.
    TimedOut,
    /// Players voted the question away.
    Skipped,
}

impl RoundOutcome {
    /// Returns `true` if the round ended with a correct answer.
    #[must_use]
    pub fn answered_in_time(self) -> bool {
        matches!(self, Self::Answered)
    }

    /// Returns the outcome name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Answered => "answered",
            Self::TimedOut => "timed_out",
            Self::Skipped => "skipped",
        }
    }
}

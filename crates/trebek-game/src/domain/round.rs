//! Round-level value types.

use std::sync::Arc;

use serde::Serialize;
use trebek_core::question::Question;
use uuid::Uuid;

use super::hint::MAX_HINTS;

/// The question currently in play, tagged with a per-round identifier.
///
/// The identifier lets delayed work (timeouts) tell its own round apart from
/// a later round that reuses the slot.
#[derive(Debug, Clone)]
pub struct ActiveRound {
    /// Unique round identifier.
    pub id: Uuid,
    /// The question being asked.
    pub question: Arc<Question>,
}

/// Outcome of a hint request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintResponse {
    /// A character was revealed.
    Granted {
        /// Category of the active question.
        category: String,
        /// The mask after the reveal.
        mask: String,
        /// Hints granted so far for this question, including this one.
        hints_used: u32,
    },
    /// No question is active.
    NoActiveQuestion,
    /// The per-question hint allowance is used up.
    MaxHintsReached,
    /// Every character is already visible.
    NothingToReveal,
}

impl HintResponse {
    /// Returns `true` if a hint was granted (and its cost should be charged).
    #[must_use]
    pub fn granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }

    /// The mask on success, otherwise a user-facing denial message.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Granted { mask, .. } => mask.clone(),
            Self::NoActiveQuestion => "No question is currently active.".to_owned(),
            Self::MaxHintsReached => {
                format!("Maximum hints ({MAX_HINTS}) reached for this question.")
            }
            Self::NothingToReveal => "No more characters to reveal for a hint.".to_owned(),
        }
    }

    /// Splits into `(text, granted)`.
    #[must_use]
    pub fn into_parts(self) -> (String, bool) {
        (self.text(), self.granted())
    }
}

/// A read-only view of the engine for status reporting. Never includes the
/// answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundSnapshot {
    /// Whether continuous play is on.
    pub playing: bool,
    /// Whether a question is active.
    pub active: bool,
    /// Category of the active question.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Prompt of the active question.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Hints granted for the active question.
    pub hints_used: u32,
    /// Skip votes cast for the active question.
    pub skip_votes: usize,
    /// Votes needed to skip.
    pub skip_vote_threshold: usize,
}

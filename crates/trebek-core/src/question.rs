//! Trivia questions and the sources that produce them.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Descriptive data carried alongside a question. Opaque to the round engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionMetadata {
    /// Dollar value shown on the board, e.g. `"$400"`.
    #[serde(default, alias = "money", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Original air date.
    #[serde(default, alias = "date", skip_serializing_if = "Option::is_none")]
    pub air_date: Option<String>,
    /// Episode (show) number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}

/// An immutable trivia question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Category the question belongs to.
    pub category: String,
    /// The clue shown to players.
    #[serde(alias = "question")]
    pub prompt: String,
    /// The expected answer.
    pub answer: String,
    /// Additional data not interpreted by the engine.
    #[serde(flatten)]
    pub metadata: QuestionMetadata,
}

impl Question {
    /// Creates a question without metadata.
    #[must_use]
    pub fn new(
        category: impl Into<String>,
        prompt: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            prompt: prompt.into(),
            answer: answer.into(),
            metadata: QuestionMetadata::default(),
        }
    }
}

/// A lazy, finite, non-restartable sequence of questions.
///
/// Implementations are read by at most one task at a time; callers serialize
/// access.
pub trait QuestionSource: Send {
    /// Produces the next question.
    ///
    /// Returns `Ok(None)` once the source is exhausted. Exhaustion is final:
    /// every later call must also return `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Source` on a transient failure. The caller may
    /// call `next` again later.
    fn next(&mut self) -> Result<Option<Question>, DomainError>;

    /// Releases the underlying resources.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Source` if the resource could not be released
    /// cleanly.
    fn close(&mut self) -> Result<(), DomainError>;
}

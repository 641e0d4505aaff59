//! Chat transport abstractions.

use async_trait::async_trait;

use crate::error::DomainError;

/// A decoded inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Channel (or nick, for private messages) the message was sent to.
    pub target: String,
    /// Nick of the sender.
    pub user: String,
    /// Message text with surrounding whitespace removed.
    pub text: String,
}

/// Outbound side of the chat transport.
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Sends `text` to `target`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Chat` if the message could not be queued for
    /// delivery.
    async fn send(&self, target: &str, text: &str) -> Result<(), DomainError>;
}

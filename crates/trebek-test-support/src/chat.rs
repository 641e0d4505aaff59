//! Test chat sinks.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use trebek_core::chat::ChatSink;
use trebek_core::error::DomainError;

/// A chat sink that records every sent `(target, text)` pair.
#[derive(Debug, Default)]
pub struct RecordingChatSink {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingChatSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of everything sent so far.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns only the message texts, in send order.
    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    /// Returns `true` if any sent text contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.texts().iter().any(|text| text.contains(needle))
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl ChatSink for RecordingChatSink {
    async fn send(&self, target: &str, text: &str) -> Result<(), DomainError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((target.to_owned(), text.to_owned()));
        Ok(())
    }
}

/// A chat sink whose connection is always gone.
#[derive(Debug)]
pub struct FailingChatSink;

#[async_trait]
impl ChatSink for FailingChatSink {
    async fn send(&self, _target: &str, _text: &str) -> Result<(), DomainError> {
        Err(DomainError::Chat("connection closed".into()))
    }
}

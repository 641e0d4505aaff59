//! Shared test mocks and utilities for the Trebek trivia engine.

mod chat;
mod clock;
mod rng;
mod source;

pub use chat::{FailingChatSink, RecordingChatSink};
pub use clock::FixedClock;
pub use rng::{MockRng, SequenceRng};
pub use source::{ScriptedQuestionSource, question, questions};

//! Test question sources.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use trebek_core::error::DomainError;
use trebek_core::question::{Question, QuestionSource};

/// Builds a question whose prompt is derived from the answer.
#[must_use]
pub fn question(answer: &str) -> Question {
    Question::new("TEST", format!("clue for {answer}"), answer)
}

/// Builds one question per answer, in order.
#[must_use]
pub fn questions(answers: &[&str]) -> Vec<Question> {
    answers.iter().map(|a| question(a)).collect()
}

/// A question source that replays a script of results, then reports
/// exhaustion forever. Counts `next` and `close` calls so tests can assert
/// how the source was driven.
#[derive(Debug)]
pub struct ScriptedQuestionSource {
    script: VecDeque<Result<Question, String>>,
    next_calls: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl ScriptedQuestionSource {
    /// A source that yields `questions` in order and then exhausts.
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self::scripted(questions.into_iter().map(Ok).collect())
    }

    /// A source that replays `script`; `Err` entries surface as transient
    /// `DomainError::Source` failures.
    #[must_use]
    pub fn scripted(script: Vec<Result<Question, String>>) -> Self {
        Self {
            script: script.into(),
            next_calls: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of `next` calls, readable after the source has been
    /// moved into a buffer.
    #[must_use]
    pub fn next_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.next_calls)
    }

    /// Shared counter of `close` calls.
    #[must_use]
    pub fn close_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closed)
    }
}

impl QuestionSource for ScriptedQuestionSource {
    fn next(&mut self) -> Result<Option<Question>, DomainError> {
        self.next_calls.fetch_add(1, Ordering::SeqCst);
        match self.script.pop_front() {
            Some(Ok(question)) => Ok(Some(question)),
            Some(Err(message)) => Err(DomainError::Source(message)),
            None => Ok(None),
        }
    }

    fn close(&mut self) -> Result<(), DomainError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

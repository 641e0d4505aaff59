//! Stateful services: prefetching, rounds, timeouts, pacing.

pub mod buffer;
pub mod engine;
pub mod quizmaster;
pub mod scheduler;
pub mod timeout;

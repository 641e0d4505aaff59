//! Trebek trivia engine — rounds, prefetching and continuous play.
//!
//! The domain layer holds the pure rules (answer matching, hint masks, skip
//! votes). The application layer owns the shared state: the prefetch
//! buffer, the round engine, per-question timeouts, the continuous-play
//! scheduler and the quizmaster that ties them to chat and scores.

pub mod application;
pub mod domain;
pub mod error;

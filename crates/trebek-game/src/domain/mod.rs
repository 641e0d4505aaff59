//! Pure trivia rules.

pub mod answer;
pub mod hint;
pub mod round;
pub mod votes;

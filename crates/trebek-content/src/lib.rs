//! Trebek trivia engine — question content.
//!
//! Responsible for turning question archives on disk into lazy
//! [`QuestionSource`]s: a JSON array of questions (the classic archive
//! dump) or JSON lines, one question per line.

pub mod error;
pub mod json_array;
pub mod json_lines;

use std::path::Path;

use trebek_core::question::QuestionSource;

pub use error::ContentError;
pub use json_array::JsonArraySource;
pub use json_lines::JsonLinesSource;

/// Opens the question archive at `path`, choosing the format by extension:
/// `.jsonl` / `.ndjson` are read line by line, anything else as a JSON array.
///
/// # Errors
///
/// Returns `ContentError` if the file cannot be opened or is not a JSON array.
pub fn open_question_source(path: &Path) -> Result<Box<dyn QuestionSource>, ContentError> {
    let lines = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("ndjson"));

    if lines {
        Ok(Box::new(JsonLinesSource::open(path)?))
    } else {
        Ok(Box::new(JsonArraySource::open(path)?))
    }
}

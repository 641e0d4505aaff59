//! Question source over a JSON-lines archive, read lazily.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};
use trebek_core::error::DomainError;
use trebek_core::question::{Question, QuestionSource};

use crate::error::ContentError;

/// Reads one question object per line, only as far as callers ask.
#[derive(Debug)]
pub struct JsonLinesSource<R = BufReader<File>> {
    reader: Option<R>,
    line_number: usize,
}

impl JsonLinesSource {
    /// Opens the archive at `path`.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Io` if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, ContentError> {
        let file = File::open(path).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "opened question stream");
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    /// Builds a source over any buffered reader.
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader: Some(reader),
            line_number: 0,
        }
    }
}

impl<R: BufRead + Send> QuestionSource for JsonLinesSource<R> {
    fn next(&mut self) -> Result<Option<Question>, DomainError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };

        let mut line = String::new();
        loop {
            line.clear();
            let read = reader.read_line(&mut line).map_err(|e| {
                DomainError::Source(format!("read failed after line {}: {e}", self.line_number))
            })?;
            if read == 0 {
                // Exhausted: release the file now rather than at close().
                self.reader = None;
                return Ok(None);
            }
            self.line_number += 1;
            if !line.trim().is_empty() {
                break;
            }
        }

        serde_json::from_str(line.trim()).map(Some).map_err(|e| {
            DomainError::Source(format!("malformed question on line {}: {e}", self.line_number))
        })
    }

    fn close(&mut self) -> Result<(), DomainError> {
        if self.reader.take().is_some() {
            debug!(lines_read = self.line_number, "closed question stream");
        }
        Ok(())
    }
}

//! Question source over a JSON array archive, streamed one element at a time.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use trebek_core::error::DomainError;
use trebek_core::question::{Question, QuestionSource};

use crate::error::ContentError;

/// Where the reader stands inside the array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// Just past `[`.
    First,
    /// Just past an element.
    Between,
}

/// Reads a JSON array of question objects without loading the whole file.
///
/// Each element is parsed into a generic JSON value first and only then
/// decoded as a question, so an element with the wrong shape costs one
/// failed `next` call. A syntax error leaves no way to find the next
/// element; it is reported once and the stream ends there.
#[derive(Debug)]
pub struct JsonArraySource<R = BufReader<File>> {
    reader: Option<R>,
    cursor: Cursor,
    position: usize,
}

impl JsonArraySource {
    /// Opens the archive at `path` and reads up to its opening bracket.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::Io` if the file cannot be read and
    /// `ContentError::NotAnArray` if it does not start with `[`.
    pub fn open(path: &Path) -> Result<Self, ContentError> {
        let io_error = |source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(io_error)?;
        let source = Self::from_reader(BufReader::new(file))
            .map_err(io_error)?
            .ok_or_else(|| ContentError::NotAnArray {
                path: path.to_path_buf(),
            })?;
        info!(path = %path.display(), "opened question archive");
        Ok(source)
    }
}

impl<R: BufRead> JsonArraySource<R> {
    /// Reads up to the opening bracket of `reader`. Returns `None` if the
    /// first token is not `[`.
    ///
    /// # Errors
    ///
    /// Returns the reader's I/O error.
    pub fn from_reader(mut reader: R) -> io::Result<Option<Self>> {
        if next_token(&mut reader)? != Some(b'[') {
            return Ok(None);
        }
        reader.consume(1);
        Ok(Some(Self {
            reader: Some(reader),
            cursor: Cursor::First,
            position: 0,
        }))
    }

    fn finish(&mut self) {
        self.reader = None;
        debug!(read = self.position, "question archive finished");
    }

    /// Steps past the separator before the next element. Returns `false` at
    /// the end of the array.
    fn advance(&mut self) -> Result<bool, DomainError> {
        let position = self.position;
        let Some(reader) = self.reader.as_mut() else {
            return Ok(false);
        };
        let read_failed = |e: io::Error| {
            DomainError::Source(format!("read failed after question #{position}: {e}"))
        };

        let mut token = next_token(reader).map_err(read_failed)?;
        if self.cursor == Cursor::Between {
            match token {
                Some(b',') => {
                    reader.consume(1);
                    // A trailing comma is tolerated.
                    token = next_token(reader).map_err(read_failed)?;
                }
                Some(b']') | None => {}
                Some(byte) => {
                    return Err(DomainError::Source(format!(
                        "expected ',' or ']' after question #{position}, found {:?}",
                        char::from(byte)
                    )));
                }
            }
        }

        match token {
            Some(b']') => {
                reader.consume(1);
                Ok(false)
            }
            Some(_) => Ok(true),
            None => {
                warn!(read = position, "question archive ends without closing bracket");
                Ok(false)
            }
        }
    }
}

impl<R: BufRead + Send> QuestionSource for JsonArraySource<R> {
    fn next(&mut self) -> Result<Option<Question>, DomainError> {
        match self.advance() {
            Ok(true) => {}
            Ok(false) => {
                self.finish();
                return Ok(None);
            }
            Err(e) => {
                self.finish();
                return Err(e);
            }
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        self.position += 1;
        self.cursor = Cursor::Between;

        let parsed = {
            let mut de = serde_json::Deserializer::from_reader(reader);
            Value::deserialize(&mut de)
        };
        let entry = match parsed {
            Ok(entry) => entry,
            Err(e) => {
                let position = self.position;
                self.finish();
                return Err(DomainError::Source(format!(
                    "unreadable question #{position}: {e}"
                )));
            }
        };

        serde_json::from_value(entry).map(Some).map_err(|e| {
            DomainError::Source(format!("malformed question #{}: {e}", self.position))
        })
    }

    fn close(&mut self) -> Result<(), DomainError> {
        if self.reader.take().is_some() {
            debug!(read = self.position, "closed question archive");
        }
        Ok(())
    }
}

/// Skips whitespace and peeks at the next byte without consuming it.
fn next_token<R: BufRead>(reader: &mut R) -> io::Result<Option<u8>> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(None);
        }
        let blank = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
        if blank < buf.len() {
            let byte = buf[blank];
            reader.consume(blank);
            return Ok(Some(byte));
        }
        let len = buf.len();
        reader.consume(len);
    }
}

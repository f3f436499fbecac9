use std::io::BufRead;

use anyhow::{Context, Result};

/// Sequential line reader that tracks how many bytes have been consumed.
///
/// The byte offset counts raw input bytes (including line terminators), so
/// `offset() / total_size()` tracks position in the underlying stream even
/// though returned lines are trimmed. When the total size is unknown the
/// caller must disable progress estimation rather than fail.
pub struct LineSource<R> {
    reader: R,
    offset: u64,
    total: Option<u64>,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: 0,
            total: None,
        }
    }

    pub fn with_total_size(reader: R, total: u64) -> Self {
        Self {
            reader,
            offset: 0,
            total: Some(total),
        }
    }

    /// Returns the next line with surrounding whitespace trimmed, or `None`
    /// at end of stream. End of stream is not an error.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        let mut buf = String::new();
        let read = self
            .reader
            .read_line(&mut buf)
            .context("failed to read input line")?;
        if read == 0 {
            return Ok(None);
        }
        self.offset += read as u64;
        Ok(Some(buf.trim().to_string()))
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn total_size(&self) -> Option<u64> {
        self.total
    }
}

//! WAL Reader
//!
//! Handles reading records from the log file, one line at a time.
//! Ordering is not checked here; that is the replayer's job.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{KvError, Result};
use super::Event;

/// Reads events from a transaction log
pub struct LogReader<R = BufReader<File>> {
    reader: R,
    line: Vec<u8>,
    line_number: u64,
    valid_len: u64,
    torn_tail: bool,
}

impl LogReader {
    /// Open a log file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> LogReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            line_number: 0,
            valid_len: 0,
            torn_tail: false,
        }
    }

    /// Read the next event from the log
    ///
    /// Blank lines are skipped. A final line with no newline was never
    /// acknowledged by the writer, so it is not returned; it only sets
    /// [`LogReader::torn_tail`].
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        loop {
            self.line.clear();
            let n = self
                .reader
                .read_until(b'\n', &mut self.line)
                .map_err(KvError::LogReadFailure)?;
            if n == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let record = match self.line.strip_suffix(b"\n") {
                Some(record) => record,
                None => {
                    self.torn_tail = true;
                    return Ok(None);
                }
            };
            self.valid_len += n as u64;
            if record.is_empty() {
                continue;
            }

            let line_number = self.line_number;
            let text = std::str::from_utf8(record).map_err(|e| KvError::DecodeFailure {
                line: line_number,
                reason: format!("record is not valid UTF-8: {}", e),
            })?;

            return Event::decode(text).map(Some).map_err(|reason| KvError::DecodeFailure {
                line: line_number,
                reason,
            });
        }
    }

    /// Number of lines consumed so far, blank lines included
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// True once the reader has hit a final line that lacked its newline
    pub fn torn_tail(&self) -> bool {
        self.torn_tail
    }

    /// Bytes of complete lines consumed so far
    ///
    /// After a torn tail this is where the unterminated fragment starts.
    pub fn valid_len(&self) -> u64 {
        self.valid_len
    }

    /// Iterate over all events; stops after the first error
    pub fn events(self) -> Events<R> {
        Events {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over log events
pub struct Events<R> {
    reader: LogReader<R>,
    done: bool,
}

impl<R: BufRead> Iterator for Events<R> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

//! WAL Recovery
//!
//! Rebuilds store state by replaying the log from the first record.
//!
//! Replay trusts nothing past the first bad record: an out-of-order sequence,
//! an undecodable record or a read error stops it immediately, leaving the
//! target in the state reached just before.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead};
use std::path::Path;

use crate::error::{KvError, Result};
use crate::store::KeyValueStore;
use super::{ApplyEvent, EventType, LogReader};

/// Result of a replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of events applied
    pub events_replayed: u64,

    pub puts: u64,

    pub deletes: u64,

    /// Highest sequence in the log (0 for an empty log); the writer continues
    /// from here
    pub last_sequence: u64,

    /// Whether the log ended in a fragment with no newline (never applied)
    pub torn_tail: bool,

    /// Length of the log up to the end of its last complete line
    pub valid_len: u64,
}

/// Replays a transaction log into an [`ApplyEvent`] target
pub struct LogReplayer;

impl LogReplayer {
    /// Replay every remaining record of `reader` into `target`
    pub fn replay<R, T>(reader: &mut LogReader<R>, target: &T) -> Result<RecoveryResult>
    where
        R: BufRead,
        T: ApplyEvent + ?Sized,
    {
        let mut result = RecoveryResult::default();

        while let Some(event) = reader.next_event()? {
            if event.sequence <= result.last_sequence {
                return Err(KvError::OutOfSequence {
                    line: reader.line_number(),
                    previous: result.last_sequence,
                    found: event.sequence,
                });
            }

            target.apply(&event);

            match event.event_type {
                EventType::Put => result.puts += 1,
                EventType::Delete => result.deletes += 1,
            }
            result.events_replayed += 1;
            result.last_sequence = event.sequence;
        }

        result.torn_tail = reader.torn_tail();
        result.valid_len = reader.valid_len();
        Ok(result)
    }

    /// Replay the log at `path` into `target`; a missing file is an empty log
    pub fn replay_file<T>(path: &Path, target: &T) -> Result<RecoveryResult>
    where
        T: ApplyEvent + ?Sized,
    {
        let mut reader = match LogReader::open(path) {
            Ok(reader) => reader,
            Err(KvError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(RecoveryResult::default())
            }
            Err(KvError::Io(e)) => return Err(KvError::LogReadFailure(e)),
            Err(e) => return Err(e),
        };
        Self::replay(&mut reader, target)
    }

    /// Open or create the log at `path` for appending, replaying it into
    /// `target` first
    ///
    /// An unterminated final fragment is cut off, so the first append
    /// starts on a fresh line. `Engine::open` and `LogWriter::open` both
    /// open their log through here.
    pub fn recover<T>(path: &Path, target: &T) -> Result<(File, RecoveryResult)>
    where
        T: ApplyEvent + ?Sized,
    {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        let mut reader = LogReader::open(path).map_err(|e| match e {
            KvError::Io(e) => KvError::LogReadFailure(e),
            other => other,
        })?;
        let result = Self::replay(&mut reader, target)?;
        drop(reader);

        if result.torn_tail {
            tracing::warn!(
                "Dropping unterminated final record of {} at byte {}",
                path.display(),
                result.valid_len
            );
            file.set_len(result.valid_len)?;
            file.sync_data()?;
        }
        Ok((file, result))
    }

    /// Check a log without touching live state
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let scratch = KeyValueStore::new();
        Self::replay_file(path, &scratch)
    }
}

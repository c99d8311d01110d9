//! WAL Writer
//!
//! The durability pipeline: many threads submit mutations, one background
//! thread appends them to the log.
//!
//! ## Pipeline
//! ```text
//!  callers ──► bounded queue ──► writer thread ──► log file
//!     │        (crossbeam)        │ seq = last + 1
//!     │                           │ write + flush (+ fsync)
//!     │                           │ apply to store
//!     └──── pending counter ◄─────┘ done
//! ```
//!
//! The writer thread is the only owner of the sequence counter, so numbering
//! needs no lock. A failed append halts the pipeline for good.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::BytesMut;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::{Mutex, RwLock};

use crate::config::{Config, WalSyncStrategy};
use crate::error::{KvError, Result};
use crate::store::KeyValueStore;
use super::pending::PendingWrites;
use super::{ApplyEvent, Event, EventType, LogReplayer};

/// A mutation waiting for its sequence number
struct Submission {
    event_type: EventType,
    key: String,
    value: String,
    ack: Option<Sender<Result<u64>>>,
}

/// State shared by the handle, the writer thread and tickets
struct Shared {
    pending: PendingWrites,
    last_sequence: AtomicU64,
}

impl Shared {
    /// The error a caller sees once the pipeline stopped making progress
    fn failure(&self) -> KvError {
        match self.pending.halted() {
            Some(message) => KvError::LogWriteFailure(message),
            None => KvError::PipelineClosed,
        }
    }
}

/// Completion handle for one submission
///
/// Resolves to the sequence number once the record is durable.
pub struct WriteTicket {
    receiver: Receiver<Result<u64>>,
    shared: Arc<Shared>,
}

impl WriteTicket {
    /// Block until the record is durable
    ///
    /// If the writer halts first, the ack carries its error, or the ack
    /// sender is dropped with the queue and the ticket reports the halt.
    pub fn wait(self) -> Result<u64> {
        match self.receiver.recv() {
            Ok(result) => result,
            Err(_) => Err(self.shared.failure()),
        }
    }

    /// Block until the record is durable or the timeout passes (`Ok(None)`)
    ///
    /// Giving up does not withdraw the submission.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<Option<u64>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => result.map(Some),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(self.shared.failure()),
        }
    }
}

/// Appends events to the transaction log from a single background thread
pub struct LogWriter {
    /// Submission side of the queue; `None` once closed
    sender: RwLock<Option<Sender<Submission>>>,

    shared: Arc<Shared>,

    /// First fatal error of the pipeline (capacity 1)
    errors: Receiver<KvError>,

    handle: Mutex<Option<JoinHandle<()>>>,

    path: PathBuf,
}

impl LogWriter {
    /// Open or create a log file and start writing after its last record
    ///
    /// The existing log is validated first, so numbering always continues
    /// from the highest sequence on disk, and a torn final record is cut
    /// off before anything is appended.
    pub fn open(path: &Path, config: &Config) -> Result<Self> {
        config.validate()?;
        let scratch = KeyValueStore::new();
        let (file, recovery) = LogReplayer::recover(path, &scratch)?;
        Self::start(file, path, recovery.last_sequence, config, None)
    }

    /// Start the writer thread on an already-opened log file
    ///
    /// `last_sequence` is the highest sequence already in the file. When a
    /// `target` is given, every event is applied to it after it is durable,
    /// in log order.
    pub fn start(
        file: File,
        path: &Path,
        last_sequence: u64,
        config: &Config,
        target: Option<Arc<dyn ApplyEvent>>,
    ) -> Result<Self> {
        config.validate()?;

        let (sender, receiver) = channel::bounded(config.buffer_capacity);
        let (error_tx, error_rx) = channel::bounded(1);

        let shared = Arc::new(Shared {
            pending: PendingWrites::default(),
            last_sequence: AtomicU64::new(last_sequence),
        });

        let consumer = Consumer {
            writer: BufWriter::new(file),
            receiver,
            shared: Arc::clone(&shared),
            errors: error_tx,
            target,
            sync_strategy: config.sync_strategy,
            unsynced: 0,
            last_sequence,
            buf: BytesMut::with_capacity(256),
        };

        let handle = thread::Builder::new()
            .name("kvwal-log-writer".to_string())
            .spawn(move || consumer.run())?;

        tracing::debug!(
            "Log writer started on {} at sequence {}",
            path.display(),
            last_sequence
        );

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            shared,
            errors: error_rx,
            handle: Mutex::new(Some(handle)),
            path: path.to_path_buf(),
        })
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Queue a put; blocks only while the queue is full
    pub fn write_put(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.submit(EventType::Put, key.into(), value.into(), None)
    }

    /// Queue a delete; blocks only while the queue is full
    pub fn write_delete(&self, key: impl Into<String>) -> Result<()> {
        self.submit(EventType::Delete, key.into(), String::new(), None)
    }

    /// Queue a put and get a ticket for its durability
    pub fn submit_put(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<WriteTicket> {
        let (ack, receiver) = channel::bounded(1);
        self.submit(EventType::Put, key.into(), value.into(), Some(ack))?;
        Ok(self.ticket(receiver))
    }

    /// Queue a delete and get a ticket for its durability
    pub fn submit_delete(&self, key: impl Into<String>) -> Result<WriteTicket> {
        let (ack, receiver) = channel::bounded(1);
        self.submit(EventType::Delete, key.into(), String::new(), Some(ack))?;
        Ok(self.ticket(receiver))
    }

    fn ticket(&self, receiver: Receiver<Result<u64>>) -> WriteTicket {
        WriteTicket {
            receiver,
            shared: Arc::clone(&self.shared),
        }
    }

    fn submit(
        &self,
        event_type: EventType,
        key: String,
        value: String,
        ack: Option<Sender<Result<u64>>>,
    ) -> Result<()> {
        if !Event::is_valid_key(&key) {
            return Err(KvError::InvalidKey(key));
        }

        // Held across the send so close() cannot slip in between the
        // counter increment and the enqueue.
        let guard = self.sender.read();
        let sender = guard.as_ref().ok_or(KvError::PipelineClosed)?;

        if let Some(message) = self.shared.pending.halted() {
            return Err(KvError::LogWriteFailure(message));
        }

        self.shared.pending.add();
        let submission = Submission {
            event_type,
            key,
            value,
            ack,
        };
        if sender.send(submission).is_err() {
            self.shared.pending.done();
            return Err(self.shared.failure());
        }
        Ok(())
    }

    // =========================================================================
    // Draining and Shutdown
    // =========================================================================

    /// Block until every write submitted so far is durable
    pub fn wait(&self) -> Result<()> {
        self.shared.pending.wait()
    }

    /// Like [`LogWriter::wait`] with a deadline; `Ok(false)` if it passed
    pub fn wait_timeout(&self, timeout: Duration) -> Result<bool> {
        self.shared.pending.wait_timeout(timeout)
    }

    /// Stop accepting writes, drain the queue, stop the thread, close the file
    ///
    /// Calling close again is a no-op.
    pub fn close(&self) -> Result<()> {
        let sender = self.sender.write().take();
        let Some(sender) = sender else {
            return Ok(());
        };
        // Dropping the only sender lets the thread exit once the queue is empty.
        drop(sender);

        let drained = self.shared.pending.wait();

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                return Err(KvError::LogWriteFailure(
                    "log writer thread panicked".to_string(),
                ));
            }
        }

        drained?;
        if let Some(message) = self.shared.pending.halted() {
            return Err(KvError::LogWriteFailure(message));
        }

        tracing::info!(
            "Transaction log {} closed at sequence {}",
            self.path.display(),
            self.last_sequence()
        );
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Channel carrying the first fatal pipeline error
    pub fn errors(&self) -> Receiver<KvError> {
        self.errors.clone()
    }

    /// Message of the fatal pipeline error, if one happened
    pub fn error(&self) -> Option<String> {
        self.shared.pending.halted()
    }

    /// Highest sequence number durably appended
    pub fn last_sequence(&self) -> u64 {
        self.shared.last_sequence.load(Ordering::Acquire)
    }

    /// Submissions not yet durable
    pub fn pending(&self) -> u64 {
        self.shared.pending.count()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.read().is_none()
    }

    pub fn is_halted(&self) -> bool {
        self.shared.pending.halted().is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::error!("Failed to close transaction log {}: {}", self.path.display(), e);
        }
    }
}

/// The writer thread
struct Consumer {
    writer: BufWriter<File>,
    receiver: Receiver<Submission>,
    shared: Arc<Shared>,
    errors: Sender<KvError>,
    target: Option<Arc<dyn ApplyEvent>>,
    sync_strategy: WalSyncStrategy,
    unsynced: usize,
    last_sequence: u64,
    buf: BytesMut,
}

impl Consumer {
    fn run(mut self) {
        while let Ok(submission) = self.receiver.recv() {
            let sequence = self.last_sequence + 1;
            let event = Event {
                sequence,
                event_type: submission.event_type,
                key: submission.key,
                value: submission.value,
            };

            if let Err(e) = self.append(&event) {
                let message = format!("append of sequence {} failed: {}", sequence, e);
                if let Some(ack) = submission.ack {
                    let _ = ack.send(Err(KvError::LogWriteFailure(message.clone())));
                }
                self.halt(message);
                return;
            }

            self.last_sequence = sequence;
            self.shared.last_sequence.store(sequence, Ordering::Release);
            tracing::trace!("Appended {} {} at sequence {}", event.event_type, event.key, sequence);

            if let Some(target) = &self.target {
                target.apply(&event);
            }
            if let Some(ack) = submission.ack {
                // The submitter may have stopped listening.
                let _ = ack.send(Ok(sequence));
            }
            self.shared.pending.done();
        }

        if let Err(e) = self.finish() {
            self.halt(format!("final sync failed: {}", e));
            return;
        }
        tracing::debug!("Log writer stopped at sequence {}", self.last_sequence);
    }

    fn append(&mut self, event: &Event) -> std::io::Result<()> {
        self.buf.clear();
        event.encode_into(&mut self.buf);
        self.writer.write_all(&self.buf)?;
        self.writer.flush()?;

        match self.sync_strategy {
            WalSyncStrategy::FlushOnly => {}
            WalSyncStrategy::EveryWrite => self.writer.get_ref().sync_data()?,
            WalSyncStrategy::EveryNEntries { count } => {
                self.unsynced += 1;
                if self.unsynced >= count {
                    self.writer.get_ref().sync_data()?;
                    self.unsynced = 0;
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> std::io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()
    }

    fn halt(&self, message: String) {
        tracing::error!("Transaction log writer halted: {}", message);
        // Only the first error fits; the slot keeps it too.
        let _ = self.errors.try_send(KvError::LogWriteFailure(message.clone()));
        self.shared.pending.halt(message.clone());

        // Fail whatever is still queued instead of leaving tickets waiting.
        while let Ok(submission) = self.receiver.try_recv() {
            if let Some(ack) = submission.ack {
                let _ = ack.send(Err(KvError::LogWriteFailure(message.clone())));
            }
        }
    }
}

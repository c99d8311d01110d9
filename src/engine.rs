//! Engine Module
//!
//! The context object that owns the store and the transaction log, and the
//! recovery sequence that builds it.
//!
//! ## Responsibilities
//! - Open or create the log file
//! - Replay the log into a fresh store before serving anything
//! - Start the log writer for new traffic
//! - Route mutations through the log before they become visible

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::Receiver;

use crate::config::Config;
use crate::error::{KvError, Result};
use crate::store::KeyValueStore;
use crate::wal::{ApplyEvent, LogReplayer, LogWriter, RecoveryResult};

/// The main storage engine
///
/// ## Write Path: write-ahead, then apply
///
/// `put` and `delete` hand the mutation to the log writer and block until it
/// is durable. The writer thread applies it to the store right after the
/// append, in log order, so:
/// - the log always holds every mutation a reader can observe
/// - concurrent writers to one key leave the store exactly as replay would
///
/// Reads go straight to the store under its read lock.
pub struct Engine {
    config: Config,

    /// Rebuilt from the log on open; mutated only by the writer thread after
    store: Arc<KeyValueStore>,

    logger: LogWriter,

    recovery: RecoveryResult,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup, each step gated on the previous:
    /// 1. Open/create the log file
    /// 2. Replay it into an empty store
    /// 3. Cut off an unterminated final record
    /// 4. Start the log writer after the last replayed sequence
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let log_path = config.log_path.clone();

        // Steps 1-3: Open or create the log, replay it, drop a torn tail;
        // any failure aborts startup
        let store = Arc::new(KeyValueStore::new());
        let (file, recovery) = match LogReplayer::recover(&log_path, store.as_ref()) {
            Ok(opened) => opened,
            Err(e) => {
                tracing::error!("Replay of {} failed: {}", log_path.display(), e);
                return Err(e);
            }
        };

        tracing::info!(
            "Replayed {} events ({} puts, {} deletes) from {}, last sequence {}",
            recovery.events_replayed,
            recovery.puts,
            recovery.deletes,
            log_path.display(),
            recovery.last_sequence
        );

        // Step 4: Only now accept new traffic
        let target: Arc<dyn ApplyEvent> = store.clone();
        let logger = LogWriter::start(
            file,
            &log_path,
            recovery.last_sequence,
            &config,
            Some(target),
        )?;

        Ok(Self {
            config,
            store,
            logger,
            recovery,
        })
    }

    /// Open with a log path (convenience method)
    ///
    /// Uses default config with the given log file
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().log_path(path).build())
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Result<String> {
        self.store.get(key)
    }

    /// Put a key-value pair once it is durable; returns its sequence number
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) -> Result<u64> {
        self.logger.submit_put(key, value)?.wait()
    }

    /// Delete a key once the deletion is durable; returns its sequence number
    ///
    /// Deleting an absent key still logs and succeeds.
    pub fn delete(&self, key: impl Into<String>) -> Result<u64> {
        self.logger.submit_delete(key)?.wait()
    }

    /// Block until every write submitted so far is durable
    pub fn wait(&self) -> Result<()> {
        self.logger.wait()
    }

    /// Deadline-bounded [`Engine::wait`]; `Ok(false)` if the deadline passed
    pub fn wait_timeout(&self, timeout: Duration) -> Result<bool> {
        self.logger.wait_timeout(timeout)
    }

    /// Close the engine gracefully
    ///
    /// Drains pending writes, stops the writer and syncs the log. Writes
    /// after this fail with `PipelineClosed`; reads keep working.
    pub fn close(&self) -> Result<()> {
        self.logger.close()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Channel carrying the first fatal log write error
    pub fn errors(&self) -> Receiver<KvError> {
        self.logger.errors()
    }

    pub fn last_sequence(&self) -> u64 {
        self.logger.last_sequence()
    }

    /// What startup replay found
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }

    pub fn store(&self) -> &Arc<KeyValueStore> {
        &self.store
    }

    pub fn logger(&self) -> &LogWriter {
        &self.logger
    }

    pub fn log_path(&self) -> &Path {
        &self.config.log_path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

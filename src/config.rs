//! Configuration for kvwal
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{KvError, Result};

/// Main configuration for a kvwal instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Log Configuration
    // -------------------------------------------------------------------------
    /// Path of the transaction log file. Parent directories are created on open.
    pub log_path: PathBuf,

    /// Sync strategy: how often the writer fsyncs the log
    pub sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // Pipeline Configuration
    // -------------------------------------------------------------------------
    /// Capacity of the bounded submission queue in front of the log writer.
    /// Submitters block (never fail) while the queue is full.
    pub buffer_capacity: usize,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// Flush each record to the OS, never fsync explicitly
    FlushOnly,

    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("./kvwal_data/transaction.log"),
            sync_strategy: WalSyncStrategy::FlushOnly,
            buffer_capacity: 16,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the writer cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity == 0 {
            return Err(KvError::Config(
                "buffer_capacity must be at least 1".to_string(),
            ));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.sync_strategy {
            return Err(KvError::Config(
                "EveryNEntries sync count must be at least 1".to_string(),
            ));
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(KvError::Config("log_path must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the transaction log path
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_path = path.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the bounded queue capacity
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.config.buffer_capacity = capacity;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

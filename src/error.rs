//! Error types for kvwal
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for kvwal operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    NotFound,

    #[error("Invalid key {0:?}: keys cannot contain tabs or newlines")]
    InvalidKey(String),

    // -------------------------------------------------------------------------
    // Replay Errors (fatal at startup)
    // -------------------------------------------------------------------------
    #[error("Transaction log out of sequence at line {line}: sequence {found} does not follow {previous}")]
    OutOfSequence { line: u64, previous: u64, found: u64 },

    #[error("Transaction log decode failure at line {line}: {reason}")]
    DecodeFailure { line: u64, reason: String },

    #[error("Transaction log read failure: {0}")]
    LogReadFailure(#[source] std::io::Error),

    // -------------------------------------------------------------------------
    // Write Pipeline Errors
    // -------------------------------------------------------------------------
    #[error("Transaction log write failed: {0}")]
    LogWriteFailure(String),

    #[error("Transaction log pipeline is closed")]
    PipelineClosed,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

//! # kvwal
//!
//! A crash-recoverable key-value store with:
//! - An append-only, tab-separated transaction log
//! - A single writer thread assigning strictly increasing sequence numbers
//! - Bounded submission queue with blocking backpressure
//! - Full-log replay on startup
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Callers (many threads)                    │
//! └──────────────┬──────────────────────────────┬───────────────┘
//!                │ put / delete                 │ get
//! ┌──────────────▼──────────────┐               │
//! │   LogWriter (bounded queue) │               │
//! │     single writer thread    │               │
//! └──────┬───────────────┬──────┘               │
//!        │ append        │ apply                │
//!        ▼               ▼                      ▼
//!  ┌───────────┐   ┌──────────────────────────────────┐
//!  │ log file  │   │     KeyValueStore (RwLock)       │
//!  └─────┬─────┘   └──────────────────────────────────┘
//!        │ replay on startup (LogReplayer)  ▲
//!        └──────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod store;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::{Config, WalSyncStrategy};
pub use engine::Engine;
pub use store::KeyValueStore;
pub use wal::{Event, EventType, LogReader, LogReplayer, LogWriter, RecoveryResult};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of kvwal
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

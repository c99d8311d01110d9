//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through an append-only transaction log.
//!
//! ## Responsibilities
//! - Serialize concurrent mutations through a single writer thread
//! - Assign strictly increasing sequence numbers
//! - Let callers wait until everything they submitted is durable
//! - Replay the log into a fresh store on startup
//!
//! ## File Format
//! One record per line, fields separated by a single tab:
//! ```text
//! ┌────────────┬────────────┬─────────────┬─────────────────┐
//! │ sequence   │ type (1|2) │ key         │ value (escaped) │ \n
//! └────────────┴────────────┴─────────────┴─────────────────┘
//!   1 = Delete (value empty), 2 = Put
//! ```
//! Values are percent-escaped. Keys are written raw, so the writer refuses
//! keys holding a tab or newline.

mod entry;
mod escape;
mod pending;
mod reader;
mod recovery;
mod writer;

pub use entry::{Event, EventType};
pub use escape::{escape, unescape};
pub use reader::{Events, LogReader};
pub use recovery::{LogReplayer, RecoveryResult};
pub use writer::{LogWriter, WriteTicket};

/// Something that can absorb logged events in log order.
///
/// The replayer feeds every recovered event through this, and the log writer
/// feeds every event once it is durable.
pub trait ApplyEvent: Send + Sync {
    fn apply(&self, event: &Event);
}

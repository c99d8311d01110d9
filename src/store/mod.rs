//! Store Module
//!
//! The in-memory key-value map that the transaction log rebuilds.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Single-writer/multi-reader access pattern
//! - Apply replayed and freshly logged events
//!
//! ## Data Structure Choice
//! HashMap wrapped in a parking_lot RwLock:
//! - Keys carry no ordering guarantee, so no BTreeMap
//! - Many concurrent readers, one writer at a time
//! - State is derived; the log is the source of truth

mod table;

pub use table::KeyValueStore;

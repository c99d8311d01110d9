//! Pending-write counter
//!
//! Counts submissions that are not yet durable and lets callers block until
//! the count drains. Once the writer halts, waiters are released with the
//! failure instead of the counter ever reaching zero on its own.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{KvError, Result};

#[derive(Debug, Default)]
struct PendingState {
    count: u64,
    halted: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct PendingWrites {
    state: Mutex<PendingState>,
    drained: Condvar,
}

impl PendingWrites {
    pub(crate) fn add(&self) {
        self.state.lock().count += 1;
    }

    pub(crate) fn done(&self) {
        let mut state = self.state.lock();
        state.count = state.count.saturating_sub(1);
        if state.count == 0 {
            self.drained.notify_all();
        }
    }

    /// Mark the pipeline as failed and release every waiter
    pub(crate) fn halt(&self, message: String) {
        let mut state = self.state.lock();
        if state.halted.is_none() {
            state.halted = Some(message);
        }
        state.count = 0;
        self.drained.notify_all();
    }

    pub(crate) fn halted(&self) -> Option<String> {
        self.state.lock().halted.clone()
    }

    pub(crate) fn count(&self) -> u64 {
        self.state.lock().count
    }

    /// Block until the count reaches zero
    pub(crate) fn wait(&self) -> Result<()> {
        let mut state = self.state.lock();
        loop {
            if let Some(message) = &state.halted {
                return Err(KvError::LogWriteFailure(message.clone()));
            }
            if state.count == 0 {
                return Ok(());
            }
            self.drained.wait(&mut state);
        }
    }

    /// Like `wait`, but gives up at the deadline and returns `Ok(false)`
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if let Some(message) = &state.halted {
                return Err(KvError::LogWriteFailure(message.clone()));
            }
            if state.count == 0 {
                return Ok(true);
            }
            if self.drained.wait_until(&mut state, deadline).timed_out() {
                if let Some(message) = &state.halted {
                    return Err(KvError::LogWriteFailure(message.clone()));
                }
                return Ok(state.count == 0);
            }
        }
    }
}

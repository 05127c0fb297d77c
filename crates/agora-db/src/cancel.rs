//! Cancellation for store calls whose caller stopped waiting.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Result, bail};
use rusqlite::{Connection, InterruptHandle};

#[derive(Default)]
enum State {
    #[default]
    Pending,
    Running(InterruptHandle),
    Ran,
    Cancelled,
}

/// Shared between one blocking store call and the task waiting on it.
///
/// A call cancelled before it reaches a connection never touches the store.
/// A call that is already running gets its current statement interrupted, and
/// the waiter has to take whatever result the call ends up with.
#[derive(Default)]
pub struct CancelToken {
    state: Mutex<State>,
}

impl CancelToken {
    /// Give up on the call. Returns `true` when it had not started, so nothing
    /// it would have written can land.
    pub fn cancel(&self) -> bool {
        let mut state = self.lock();
        match &*state {
            State::Pending | State::Cancelled => {
                *state = State::Cancelled;
                true
            }
            State::Running(handle) => {
                handle.interrupt();
                false
            }
            State::Ran => false,
        }
    }

    /// Claim `conn` for the call. Fails once the call has been cancelled.
    pub(crate) fn begin(&self, conn: &Connection) -> Result<Running<'_>> {
        let mut state = self.lock();
        if matches!(*state, State::Cancelled) {
            bail!("store call cancelled before it started");
        }
        *state = State::Running(conn.get_interrupt_handle());
        Ok(Running(self))
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held while the call owns a connection. The interrupt handle is dropped
/// with it, before the connection goes back to other callers.
pub(crate) struct Running<'a>(&'a CancelToken);

impl Drop for Running<'_> {
    fn drop(&mut self) {
        *self.0.lock() = State::Ran;
    }
}

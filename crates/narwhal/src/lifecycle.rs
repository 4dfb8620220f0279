//! Compute state machine shared by every layout.
//!
//! ```text
//! Idle | Finished | Aborted --begin--> Running --finish--> Finished
//!                                        |
//!                                      abort
//!                                        v
//!                                     Aborting --finish--> Aborted
//! ```
//!
//! Aborting is cooperative: the running loop polls the state between iterations.

use crate::error::{Error, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComputeState {
    #[default]
    Idle,
    Running,
    Aborting,
    Finished,
    Aborted,
}

impl ComputeState {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Aborting)
    }
}

/// Cloneable handle to a layout's compute state.
///
/// A blocking `compute()` keeps its caller busy; another thread holding a handle can watch
/// [`ControlHandle::state`] and request [`ControlHandle::abort`].
#[derive(Debug, Clone, Default)]
pub struct ControlHandle {
    state: Arc<Mutex<ComputeState>>,
}

impl ControlHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ComputeState> {
        // A poisoned lock still holds a valid state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ComputeState {
        *self.lock()
    }

    pub fn is_abort_requested(&self) -> bool {
        *self.lock() == ComputeState::Aborting
    }

    /// Requests a running computation to stop after its current iteration.
    ///
    /// Returns `Ok(false)` if an abort is already pending.
    pub fn abort(&self) -> Result<bool> {
        let mut state = self.lock();
        match *state {
            ComputeState::Running => {
                *state = ComputeState::Aborting;
                tracing::debug!("layout abort requested");
                Ok(true)
            }
            ComputeState::Aborting => Ok(false),
            other => Err(Error::InvalidState {
                operation: "abort",
                state: other,
            }),
        }
    }

    pub(crate) fn begin(&self, operation: &'static str) -> Result<()> {
        let mut state = self.lock();
        if state.is_active() {
            return Err(Error::InvalidState {
                operation,
                state: *state,
            });
        }
        *state = ComputeState::Running;
        Ok(())
    }

    /// Leaves the active states: `Running` ends as `Finished`, `Aborting` as `Aborted`.
    pub(crate) fn finish(&self) -> ComputeState {
        let mut state = self.lock();
        *state = match *state {
            ComputeState::Running => ComputeState::Finished,
            ComputeState::Aborting => ComputeState::Aborted,
            other => other,
        };
        *state
    }

    pub(crate) fn fail(&self) {
        *self.lock() = ComputeState::Aborted;
    }
}

//! Cooperative cancellation shared between the host and a running command.
//!
//! Cancellation is polled at fixed checkpoints and is never preemptive: once
//! a provider call has started it runs to completion before the flag is
//! observed again.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::DriverError;

/// Shared flag the host raises to request cancellation of the current
/// command.
///
/// Clones observe the same underlying flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the cancellation flag. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fails with [`DriverError::Cancelled`] when the flag is raised.
    ///
    /// Multi-stage operations call this between stages so remaining stages
    /// are abandoned while results already produced stay with the caller.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Cancelled`] when cancellation was requested.
    pub fn checkpoint(&self) -> Result<(), DriverError> {
        if self.is_cancelled() {
            return Err(DriverError::Cancelled);
        }
        Ok(())
    }
}

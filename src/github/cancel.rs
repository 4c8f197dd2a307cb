//! Cooperative cancellation shared between a caller and a running collection.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::error::ActivityError;

/// Flag checked between requests; once cancelled it stays cancelled.
///
/// Clones share the same flag, so a clone handed to a signal handler or
/// another thread can stop a run in progress.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once [`cancel`](Self::cancel) has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fails with [`ActivityError::Cancelled`] when cancellation was requested.
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::Cancelled`] after [`cancel`](Self::cancel).
    pub fn check(&self) -> Result<(), ActivityError> {
        if self.is_cancelled() {
            Err(ActivityError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CancellationToken;
    use crate::github::error::ActivityError;

    #[test]
    fn clones_observe_cancellation() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert_eq!(observer.check(), Ok(()));

        token.cancel();

        assert!(observer.is_cancelled());
        assert_eq!(observer.check(), Err(ActivityError::Cancelled));
    }
}

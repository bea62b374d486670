//! Cancellation and deadline carried into every backend call

use crate::error::BackendError;
use crate::reference::BackendKind;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Deadline used when `now + timeout` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Cancellation token and deadline of a resolution pass.
#[derive(Debug, Clone)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Instant,
}

impl CallContext {
    /// Context with an absolute deadline.
    #[must_use]
    pub const fn new(cancel: CancellationToken, deadline: Instant) -> Self {
        Self { cancel, deadline }
    }

    /// Context whose deadline is `timeout` from now, saturating at a far-future
    /// deadline for very large timeouts.
    #[must_use]
    pub fn with_timeout(cancel: CancellationToken, timeout: Duration) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(timeout)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        Self::new(cancel, deadline)
    }

    /// Whether the pass was cancelled or its deadline has passed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || Instant::now() >= self.deadline
    }

    /// Fail fast if the pass is already over.
    ///
    /// # Errors
    ///
    /// Returns a transient error when cancelled or past the deadline.
    pub fn check(&self, backend: BackendKind, locator: &str) -> Result<(), BackendError> {
        if self.cancel.is_cancelled() {
            return Err(BackendError::transient(backend, locator, "cancelled"));
        }
        if Instant::now() >= self.deadline {
            return Err(BackendError::transient(backend, locator, "deadline exceeded"));
        }
        Ok(())
    }

    /// Run `fut` until it finishes, the pass is cancelled, or the deadline passes.
    ///
    /// A dropped in-flight call surfaces as [`BackendError::Transient`].
    ///
    /// # Errors
    ///
    /// Returns the future's own error, or a transient error on cancellation/deadline.
    pub async fn guard<T, F>(
        &self,
        backend: BackendKind,
        locator: &str,
        fut: F,
    ) -> Result<T, BackendError>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                Err(BackendError::transient(backend, locator, "cancelled"))
            }
            result = tokio::time::timeout_at(self.deadline, fut) => {
                result.unwrap_or_else(|_| {
                    Err(BackendError::transient(backend, locator, "deadline exceeded"))
                })
            }
        }
    }
}

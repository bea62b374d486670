//! Resolution tuning knobs

use std::time::Duration;

/// Default number of backend calls in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 8;
/// Default deadline for a whole resolution pass.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default number of retries after a transient failure.
pub const DEFAULT_RETRIES: u32 = 2;
/// Default delay before the first retry; doubled on each further attempt.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Configuration for a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveConfig {
    /// Maximum concurrent backend calls (at least 1)
    pub concurrency: usize,
    /// Deadline for the whole pass; every backend call inherits it
    pub timeout: Duration,
    /// Retries after a transient failure
    pub retries: u32,
    /// Delay before the first retry
    pub retry_backoff: Duration,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

impl ResolveConfig {
    /// Set the concurrency limit; zero is clamped to one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the deadline for the whole pass.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry count and initial backoff.
    #[must_use]
    pub const fn with_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.retries = retries;
        self.retry_backoff = backoff;
        self
    }

    /// Backoff before retry number `attempt` (zero-based).
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.retry_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

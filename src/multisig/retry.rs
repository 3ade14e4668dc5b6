//! Submission retry policy
//!
//! Retry behavior is a plain value handed to the coordinator, so tests
//! inject a zero-delay policy and production uses [`SUBMIT_RETRY`].

use std::time::Duration;

/// Default submit loop: three attempts, two seconds apart
pub const SUBMIT_RETRY: RetryPolicy = RetryPolicy {
    max_attempts: 3,
    backoff: Duration::from_secs(2),
};

/// How long to poll for a submitted transaction to be accepted
pub const ACCEPTANCE_TIMEOUT: Duration = Duration::from_secs(120);

/// Per-request timeout a network submitter should apply to each call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A fixed-backoff retry schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, backoff: Duration) -> Self {
        RetryPolicy {
            max_attempts,
            backoff,
        }
    }

    /// Same attempt count with no sleeping, for tests
    pub const fn no_delay(max_attempts: u32) -> Self {
        RetryPolicy {
            max_attempts,
            backoff: Duration::ZERO,
        }
    }

    /// Block between attempts. A zero backoff returns immediately.
    pub fn wait(&self) {
        if !self.backoff.is_zero() {
            std::thread::sleep(self.backoff);
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        SUBMIT_RETRY
    }
}

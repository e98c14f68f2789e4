use std::time::Duration;

use crate::config::MedqConfig;

/// High-level classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network-level failure or short read; worth another attempt.
    Transient,
    /// Session no longer valid; the job goes back to the queue for another worker.
    AuthExpired,
    /// Media unavailable or local storage broken; retrying will not help.
    Permanent,
    /// User cancellation observed mid-transfer.
    Cancelled,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    NoRetry,
    RetryAfter(Duration),
}

/// Fixed-delay retry policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts per job (including the first).
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &MedqConfig) -> Self {
        Self {
            max_attempts: cfg.max_retries.max(1),
            delay: cfg.recoverable_fail_wait_delay(),
        }
    }

    /// `attempt` is 1-based (1 = first attempt).
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        match kind {
            ErrorKind::Transient => RetryDecision::RetryAfter(self.delay),
            ErrorKind::AuthExpired | ErrorKind::Permanent | ErrorKind::Cancelled => {
                RetryDecision::NoRetry
            }
        }
    }
}

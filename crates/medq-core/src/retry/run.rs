//! Retry loop: run an attempt until success or the policy says stop.

use super::classify::classify;
use super::error::TransferError;
use super::policy::{RetryDecision, RetryPolicy};
use std::time::Duration;

/// Runs `attempt` until it succeeds or the policy gives up. Before each
/// retry, `on_retry(next_attempt, &error, delay)` is called so the caller
/// can report it, then `wait(delay)` pauses. An `Err` from `wait` ends the
/// loop with that error. Returns the last attempt's error on give-up.
pub fn run_with_retry<T, F, R, W>(
    policy: &RetryPolicy,
    mut attempt: F,
    mut on_retry: R,
    mut wait: W,
) -> Result<T, TransferError>
where
    F: FnMut(u32) -> Result<T, TransferError>,
    R: FnMut(u32, &TransferError, Duration),
    W: FnMut(Duration) -> Result<(), TransferError>,
{
    let mut n = 1u32;
    loop {
        match attempt(n) {
            Ok(v) => return Ok(v),
            Err(e) => match policy.decide(n, classify(&e)) {
                RetryDecision::NoRetry => return Err(e),
                RetryDecision::RetryAfter(d) => {
                    on_retry(n + 1, &e, d);
                    wait(d)?;
                    n += 1;
                }
            },
        }
    }
}

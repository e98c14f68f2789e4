//! Transfer error classification and retry policy.
//!
//! Workers classify each failed attempt (transient, expired session,
//! permanent) and ask the policy whether to try again. The delay between
//! attempts is fixed; there is no exponential backoff.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::classify;
pub use error::TransferError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;

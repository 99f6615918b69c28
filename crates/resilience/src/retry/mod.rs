//! Retry with configurable backoff.
//!
//! A [`RetryPolicy`] says how often and how patiently to retry; a
//! [`RetryExecutor`] applies it to an operation from either async or
//! blocking code. Waiting goes through a [`Sleeper`], which tests replace
//! with [`NoopSleeper`].
//!
//! ```rust,no_run
//! use rampart_resilience::retry::{retry, RetryPolicy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = retry(RetryPolicy::for_network())?;
//! let body = executor
//!     .execute(|| async { std::fs::read_to_string("/etc/hostname") })
//!     .await?;
//! # let _ = body;
//! # Ok(())
//! # }
//! ```

pub mod executor;
pub mod policy;
pub mod sleeper;

pub use executor::{RetryAttempt, RetryCallback, RetryExecutor};
pub use policy::{Backoff, RetryPolicy};
pub use sleeper::{NoopSleeper, Sleeper, TokioSleeper};

use rampart_core::Result;

/// Build an executor for `policy` using real sleeps
pub fn retry(policy: RetryPolicy) -> Result<RetryExecutor> {
    RetryExecutor::new(policy)
}

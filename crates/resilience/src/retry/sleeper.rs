//! Pluggable waiting between retry attempts.

use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

/// Waits out a backoff delay. The executor only ever sleeps through this
/// trait, so tests can swap in an instant or recording implementation.
#[async_trait]
pub trait Sleeper: Send + Sync + Debug {
    /// Suspend the current task for `duration`
    async fn sleep(&self, duration: Duration);

    /// Block the current thread for `duration`
    fn sleep_blocking(&self, duration: Duration);
}

/// Real sleeping: `tokio::time::sleep` for tasks, `std::thread::sleep` for
/// threads
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn sleep_blocking(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Returns immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSleeper;

#[async_trait]
impl Sleeper for NoopSleeper {
    async fn sleep(&self, _duration: Duration) {}

    fn sleep_blocking(&self, _duration: Duration) {}
}

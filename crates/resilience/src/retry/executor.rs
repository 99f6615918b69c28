//! Runs an operation until it succeeds, fails with a non-retryable error, or
//! runs out of attempts.

use super::policy::RetryPolicy;
use super::sleeper::{Sleeper, TokioSleeper};
use rampart_core::{ErrorKind, Result};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// A failed attempt that is about to be retried
#[derive(Clone, Copy)]
pub struct RetryAttempt<'a> {
    /// Number of the attempt that just failed, starting at 1
    pub attempt: u32,
    /// [`ErrorKind`] name of the failure, as matched against the policy
    pub kind: &'a str,
    pub error: &'a dyn fmt::Display,
    /// Delay before the next attempt
    pub delay: Duration,
}

impl fmt::Debug for RetryAttempt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAttempt")
            .field("attempt", &self.attempt)
            .field("kind", &self.kind)
            .field("error", &format_args!("{}", self.error))
            .field("delay", &self.delay)
            .finish()
    }
}

/// Observer invoked between attempts
pub type RetryCallback = Arc<dyn Fn(&RetryAttempt<'_>) + Send + Sync>;

#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    on_retry: Option<RetryCallback>,
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .field("sleeper", &self.sleeper)
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            sleeper: Arc::new(TokioSleeper),
            on_retry: None,
        })
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn on_retry<F>(mut self, callback: F) -> Self
    where
        F: Fn(&RetryAttempt<'_>) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(callback));
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute an async operation, retrying per the policy. The last error
    /// is returned as the operation produced it.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: ErrorKind + fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    let Some(delay) = self.next_delay(attempt, &error) else {
                        return Err(error);
                    };
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Execute a blocking operation, retrying per the policy
    pub fn execute_blocking<F, T, E>(&self, mut operation: F) -> std::result::Result<T, E>
    where
        F: FnMut() -> std::result::Result<T, E>,
        E: ErrorKind + fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(error) => {
                    let Some(delay) = self.next_delay(attempt, &error) else {
                        return Err(error);
                    };
                    self.sleeper.sleep_blocking(delay);
                    attempt += 1;
                }
            }
        }
    }

    /// Decide what follows a failed `attempt`: `None` to give up, otherwise
    /// the delay before the next one. Fires the retry callback.
    fn next_delay<E>(&self, attempt: u32, error: &E) -> Option<Duration>
    where
        E: ErrorKind + fmt::Display,
    {
        let kind = error.kind();
        if !self.policy.is_retryable(&kind) {
            tracing::debug!(attempt, kind = %kind, %error, "error not retryable");
            return None;
        }
        if attempt >= self.policy.max_attempts {
            tracing::warn!(
                attempts = attempt,
                kind = %kind,
                %error,
                "retries exhausted"
            );
            return None;
        }

        let delay = self.policy.delay_for(attempt + 1);
        tracing::warn!(
            attempt,
            max_attempts = self.policy.max_attempts,
            kind = %kind,
            %error,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "attempt failed, retrying"
        );
        if let Some(callback) = &self.on_retry {
            callback(&RetryAttempt {
                attempt,
                kind: &kind,
                error,
                delay,
            });
        }
        Some(delay)
    }
}

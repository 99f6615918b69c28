//! Retry policy: how many attempts, how long to wait, which errors qualify.

use rampart_core::serde_helpers::duration_ms;
use rampart_core::{Error, Result, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Growth of the delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// Same delay before every retry
    Fixed,
    /// `base_delay * N` before attempt N
    Linear,
    /// `base_delay * 2^(N-2)` before attempt N
    #[default]
    Exponential,
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    #[serde(with = "duration_ms")]
    pub base_delay: Duration,
    #[serde(with = "duration_ms")]
    pub max_delay: Duration,
    pub backoff: Backoff,
    /// Scale each delay by a uniform factor in [0, 1]
    pub jitter: bool,
    /// Error kinds worth retrying. `None` retries every error.
    pub retryable_errors: Option<BTreeSet<String>>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff: Backoff::Exponential,
            jitter: false,
            retryable_errors: None,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, backoff: Backoff) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff,
            ..Default::default()
        }
    }

    /// Create a policy for network operations
    pub fn for_network() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff: Backoff::Exponential,
            jitter: true,
            retryable_errors: Some(kinds(&[
                "TimedOut",
                "ConnectionRefused",
                "ConnectionReset",
                "ConnectionAborted",
                "BrokenPipe",
                "Interrupted",
                "WouldBlock",
                "LockTimeout",
                "PoolFull",
                "PoolTimeout",
                "CircuitOpen",
            ])),
        }
    }

    /// Create a policy for fast local retries (e.g., file operations)
    pub fn for_filesystem() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
            backoff: Backoff::Exponential,
            jitter: true,
            retryable_errors: Some(kinds(&[
                "Interrupted",
                "WouldBlock",
                "TimedOut",
                "ResourceBusy",
                "LockTimeout",
            ])),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_retryable_errors<I, S>(mut self, errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retryable_errors = Some(errors.into_iter().map(Into::into).collect());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::configuration("retry max_attempts must be at least 1"));
        }
        if self.max_delay < self.base_delay {
            return Err(Error::configuration(format!(
                "retry max_delay ({:?}) is shorter than base_delay ({:?})",
                self.max_delay, self.base_delay
            )));
        }
        Ok(())
    }

    /// Whether an error of `kind` should be retried
    pub fn is_retryable(&self, kind: &str) -> bool {
        self.retryable_errors
            .as_ref()
            .map_or(true, |kinds| kinds.contains(kind))
    }

    /// Delay before attempt `attempt` (1-based), before jitter. Attempt 1
    /// never waits.
    pub fn base_delay_for(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let scaled = match self.backoff {
            Backoff::Fixed => Some(self.base_delay),
            Backoff::Linear => self.base_delay.checked_mul(attempt),
            Backoff::Exponential => 2u32
                .checked_pow(attempt - 2)
                .and_then(|factor| self.base_delay.checked_mul(factor)),
        };
        scaled.map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Delay before attempt `attempt`, with jitter applied if enabled
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.base_delay_for(attempt);
        if self.jitter {
            delay.mul_f64(rand::random::<f64>())
        } else {
            delay
        }
    }
}

fn kinds(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| (*name).to_string()).collect()
}

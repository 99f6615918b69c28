//! Configuration for circuit breaker behavior.

use rampart_core::serde_helpers::{duration_ms, option_duration_ms};
use rampart_core::{
    Error, Result, DEFAULT_FAILURE_THRESHOLD, DEFAULT_HALF_OPEN_MAX_CALLS,
    DEFAULT_RECOVERY_TIMEOUT,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Number of failures before opening the circuit
    pub failure_threshold: u32,
    /// Duration to wait before letting a probe through an open circuit
    #[serde(with = "duration_ms")]
    pub recovery_timeout: Duration,
    /// Maximum number of concurrent probes in half-open state
    pub half_open_max_calls: u32,
    /// Failures further apart than this no longer accumulate
    #[serde(with = "option_duration_ms")]
    pub failure_window: Option<Duration>,
    /// Error kinds that count against the circuit in the classified call
    /// variants. `None` counts every error.
    pub failure_kinds: Option<BTreeSet<String>>,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout: DEFAULT_RECOVERY_TIMEOUT,
            half_open_max_calls: DEFAULT_HALF_OPEN_MAX_CALLS,
            failure_window: None,
            failure_kinds: None,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn new(failure_threshold: u32, recovery_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            recovery_timeout,
            ..Default::default()
        }
    }

    /// Create a breaker config for flaky remote services
    pub fn for_network() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            half_open_max_calls: 1,
            failure_window: Some(Duration::from_secs(60)),
            failure_kinds: None,
        }
    }

    pub fn with_failure_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failure_kinds = Some(kinds.into_iter().map(Into::into).collect());
        self
    }

    /// Whether an error of `kind` counts as a failure
    pub fn counts(&self, kind: &str) -> bool {
        self.failure_kinds
            .as_ref()
            .map_or(true, |kinds| kinds.contains(kind))
    }

    pub fn validate(&self) -> Result<()> {
        if self.failure_threshold == 0 {
            return Err(Error::configuration(
                "circuit breaker failure_threshold must be at least 1",
            ));
        }
        if self.half_open_max_calls == 0 {
            return Err(Error::configuration(
                "circuit breaker half_open_max_calls must be at least 1",
            ));
        }
        Ok(())
    }
}

//! Core types for circuit breaker functionality.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CircuitState {
    /// Circuit is closed - requests pass through normally
    Closed,
    /// Circuit is open - requests fail immediately
    Open,
    /// Circuit is half-open - a limited number of probes test recovery
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Immutable snapshot of a breaker. Every transition produces a new value;
/// nothing mutates a snapshot in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerState {
    pub state: CircuitState,
    pub failure_count: u32,
    pub last_failure_time: Option<Instant>,
    /// Only meaningful while open. `None` while open means the recovery
    /// timeout overflowed the clock and the circuit stays open until reset.
    pub next_attempt_time: Option<Instant>,
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
    /// Probes admitted during the current half-open period
    pub half_open_calls: u32,
    /// Bumped on every state change; outcomes from an older generation are
    /// discarded.
    pub generation: u64,
}

/// What the breaker decided about an incoming call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Run the call; `next` replaces the current snapshot
    Allow {
        next: CircuitBreakerState,
        probe: bool,
    },
    /// Fail fast without running the call
    Reject { remaining: Duration },
}

/// How a finished call should be recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    /// The call failed in a way the breaker was told not to count
    Ignored,
}

/// Statistics about circuit breaker state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CircuitBreakerStats {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
    pub half_open_calls: u32,
    /// Time until the next probe is allowed, while open
    pub retry_after: Option<Duration>,
    pub generation: u64,
}

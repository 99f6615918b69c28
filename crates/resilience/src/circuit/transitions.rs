//! State transition logic for circuit breaker.
//!
//! Every function here is pure: it takes the current snapshot (and the
//! current time where relevant) and returns the next snapshot. Locking and
//! logging live in [`super::state`].

use super::config::CircuitBreakerConfig;
use super::types::{Admission, CircuitBreakerState, CircuitState, Outcome};
use std::time::Duration;
use tokio::time::Instant;

/// Snapshot of a freshly constructed breaker
pub fn initial(config: &CircuitBreakerConfig) -> CircuitBreakerState {
    CircuitBreakerState {
        state: CircuitState::Closed,
        failure_count: 0,
        last_failure_time: None,
        next_attempt_time: None,
        failure_threshold: config.failure_threshold,
        recovery_timeout: config.recovery_timeout,
        half_open_calls: 0,
        generation: 0,
    }
}

/// Decide whether a call may run now
pub fn admit(current: &CircuitBreakerState, now: Instant, half_open_max_calls: u32) -> Admission {
    match current.state {
        CircuitState::Closed => Admission::Allow {
            next: *current,
            probe: false,
        },
        CircuitState::Open => match current.next_attempt_time {
            Some(due) if now >= due => {
                let mut next = to_half_open(current);
                next.half_open_calls = 1;
                Admission::Allow { next, probe: true }
            }
            Some(due) => Admission::Reject {
                remaining: due.saturating_duration_since(now),
            },
            // Recovery time past the end of the clock: only `reset` closes it.
            None => Admission::Reject {
                remaining: Duration::MAX,
            },
        },
        CircuitState::HalfOpen => {
            if current.half_open_calls < half_open_max_calls {
                Admission::Allow {
                    next: CircuitBreakerState {
                        half_open_calls: current.half_open_calls + 1,
                        ..*current
                    },
                    probe: true,
                }
            } else {
                Admission::Reject {
                    remaining: Duration::ZERO,
                }
            }
        }
    }
}

/// Apply the outcome of a finished call
pub fn record(
    current: &CircuitBreakerState,
    outcome: Outcome,
    probe: bool,
    now: Instant,
    failure_window: Option<Duration>,
) -> CircuitBreakerState {
    match outcome {
        Outcome::Success => on_success(current),
        Outcome::Failure => on_failure(current, now, failure_window),
        Outcome::Ignored if probe => release_probe(current),
        Outcome::Ignored => *current,
    }
}

pub fn on_success(current: &CircuitBreakerState) -> CircuitBreakerState {
    match current.state {
        CircuitState::Closed => CircuitBreakerState {
            failure_count: 0,
            last_failure_time: None,
            ..*current
        },
        CircuitState::HalfOpen => to_closed(current),
        // Stale outcomes are filtered by generation before reaching here.
        CircuitState::Open => *current,
    }
}

pub fn on_failure(
    current: &CircuitBreakerState,
    now: Instant,
    failure_window: Option<Duration>,
) -> CircuitBreakerState {
    match current.state {
        CircuitState::Closed => {
            let expired = match (failure_window, current.last_failure_time) {
                (Some(window), Some(last)) => now.saturating_duration_since(last) > window,
                _ => false,
            };
            let failure_count = if expired { 1 } else { current.failure_count + 1 };
            let next = CircuitBreakerState {
                failure_count,
                last_failure_time: Some(now),
                ..*current
            };
            if failure_count >= current.failure_threshold {
                to_open(&next, now)
            } else {
                next
            }
        }
        CircuitState::HalfOpen => to_open(
            &CircuitBreakerState {
                failure_count: current.failure_count + 1,
                last_failure_time: Some(now),
                ..*current
            },
            now,
        ),
        CircuitState::Open => CircuitBreakerState {
            last_failure_time: Some(now),
            ..*current
        },
    }
}

/// Give back a probe slot whose call never produced a countable outcome
pub fn release_probe(current: &CircuitBreakerState) -> CircuitBreakerState {
    match current.state {
        CircuitState::HalfOpen => CircuitBreakerState {
            half_open_calls: current.half_open_calls.saturating_sub(1),
            ..*current
        },
        _ => *current,
    }
}

pub fn on_reset(current: &CircuitBreakerState) -> CircuitBreakerState {
    to_closed(current)
}

fn to_open(current: &CircuitBreakerState, now: Instant) -> CircuitBreakerState {
    CircuitBreakerState {
        state: CircuitState::Open,
        next_attempt_time: now.checked_add(current.recovery_timeout),
        half_open_calls: 0,
        generation: current.generation + 1,
        ..*current
    }
}

fn to_half_open(current: &CircuitBreakerState) -> CircuitBreakerState {
    CircuitBreakerState {
        state: CircuitState::HalfOpen,
        next_attempt_time: None,
        half_open_calls: 0,
        generation: current.generation + 1,
        ..*current
    }
}

fn to_closed(current: &CircuitBreakerState) -> CircuitBreakerState {
    CircuitBreakerState {
        state: CircuitState::Closed,
        failure_count: 0,
        last_failure_time: None,
        next_attempt_time: None,
        half_open_calls: 0,
        generation: current.generation + 1,
        ..*current
    }
}

//! Circuit breaker state management and execution logic.

use super::config::CircuitBreakerConfig;
use super::transitions;
use super::types::{Admission, CircuitBreakerState, CircuitBreakerStats, CircuitState, Outcome};
use parking_lot::Mutex;
use rampart_core::{CallError, Error, ErrorKind, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Circuit breaker implementation
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    snapshot: Mutex<CircuitBreakerState>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given configuration
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Result<Self> {
        config.validate()?;
        let snapshot = Mutex::new(transitions::initial(&config));
        Ok(Self {
            name: name.into(),
            config,
            snapshot,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Stored state. An open circuit whose recovery timeout has elapsed stays
    /// `Open` here until a call arrives to probe it.
    pub fn state(&self) -> CircuitState {
        self.snapshot.lock().state
    }

    /// Copy of the current snapshot
    pub fn snapshot(&self) -> CircuitBreakerState {
        *self.snapshot.lock()
    }

    /// Get current circuit breaker statistics
    pub fn stats(&self) -> CircuitBreakerStats {
        let current = self.snapshot();
        let now = Instant::now();
        let retry_after = match current.state {
            CircuitState::Open => Some(
                current
                    .next_attempt_time
                    .map_or(Duration::MAX, |due| due.saturating_duration_since(now)),
            ),
            _ => None,
        };
        CircuitBreakerStats {
            name: self.name.clone(),
            state: current.state,
            failure_count: current.failure_count,
            failure_threshold: current.failure_threshold,
            recovery_timeout: current.recovery_timeout,
            half_open_calls: current.half_open_calls,
            retry_after,
            generation: current.generation,
        }
    }

    /// Force the circuit closed and clear its counters
    pub fn reset(&self) {
        let mut snapshot = self.snapshot.lock();
        let next = transitions::on_reset(&snapshot);
        self.replace(&mut snapshot, next);
    }

    /// Execute an operation through the circuit breaker. Every error the
    /// operation returns counts as a failure.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> std::result::Result<T, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        self.call_with(|_| true, operation).await
    }

    /// Like [`call`](Self::call), but only errors for which `is_failure`
    /// returns true are counted against the circuit.
    pub async fn call_with<P, F, Fut, T, E>(
        &self,
        is_failure: P,
        operation: F,
    ) -> std::result::Result<T, CallError<E>>
    where
        P: FnOnce(&E) -> bool,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let permit = self.admit()?;
        let result = operation().await;
        permit.settle(classify(&result, is_failure));
        result.map_err(CallError::Inner)
    }

    /// Like [`call`](Self::call), but only errors whose kind is listed in
    /// the config's `failure_kinds` are counted against the circuit.
    pub async fn call_classified<F, Fut, T, E>(
        &self,
        operation: F,
    ) -> std::result::Result<T, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: ErrorKind,
    {
        self.call_with(|error: &E| self.config.counts(&error.kind()), operation)
            .await
    }

    /// Blocking counterpart of [`call`](Self::call); runs `operation` on the
    /// current thread.
    pub fn call_blocking<F, T, E>(&self, operation: F) -> std::result::Result<T, CallError<E>>
    where
        F: FnOnce() -> std::result::Result<T, E>,
    {
        self.call_blocking_with(|_| true, operation)
    }

    pub fn call_blocking_with<P, F, T, E>(
        &self,
        is_failure: P,
        operation: F,
    ) -> std::result::Result<T, CallError<E>>
    where
        P: FnOnce(&E) -> bool,
        F: FnOnce() -> std::result::Result<T, E>,
    {
        let permit = self.admit()?;
        let result = operation();
        permit.settle(classify(&result, is_failure));
        result.map_err(CallError::Inner)
    }

    pub fn call_blocking_classified<F, T, E>(
        &self,
        operation: F,
    ) -> std::result::Result<T, CallError<E>>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: ErrorKind,
    {
        self.call_blocking_with(|error: &E| self.config.counts(&error.kind()), operation)
    }

    fn admit(&self) -> Result<Permit<'_>> {
        let now = Instant::now();
        let mut snapshot = self.snapshot.lock();
        match transitions::admit(&snapshot, now, self.config.half_open_max_calls) {
            Admission::Allow { next, probe } => {
                self.replace(&mut snapshot, next);
                tracing::trace!(breaker = %self.name, probe, "call admitted");
                Ok(Permit {
                    breaker: self,
                    generation: next.generation,
                    probe,
                    settled: false,
                })
            }
            Admission::Reject { remaining } => {
                tracing::debug!(
                    breaker = %self.name,
                    state = %snapshot.state,
                    remaining_ms = u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX),
                    "call rejected"
                );
                Err(Error::circuit_open(self.name.clone(), remaining))
            }
        }
    }

    fn record(&self, generation: u64, probe: bool, outcome: Outcome) {
        let now = Instant::now();
        let mut snapshot = self.snapshot.lock();
        if snapshot.generation != generation {
            tracing::trace!(
                breaker = %self.name,
                generation,
                current = snapshot.generation,
                "discarding stale outcome"
            );
            return;
        }
        let next = transitions::record(&snapshot, outcome, probe, now, self.config.failure_window);
        self.replace(&mut snapshot, next);
    }

    fn replace(&self, snapshot: &mut CircuitBreakerState, next: CircuitBreakerState) {
        let previous = std::mem::replace(snapshot, next);
        if previous.state == next.state {
            return;
        }
        match next.state {
            CircuitState::Open => tracing::warn!(
                breaker = %self.name,
                from = %previous.state,
                failures = next.failure_count,
                recovery_ms = u64::try_from(next.recovery_timeout.as_millis()).unwrap_or(u64::MAX),
                "circuit opened"
            ),
            CircuitState::HalfOpen => tracing::info!(
                breaker = %self.name,
                "circuit half-open, probing"
            ),
            CircuitState::Closed => tracing::info!(
                breaker = %self.name,
                from = %previous.state,
                "circuit closed"
            ),
        }
    }
}

fn classify<T, E, P>(result: &std::result::Result<T, E>, is_failure: P) -> Outcome
where
    P: FnOnce(&E) -> bool,
{
    match result {
        Ok(_) => Outcome::Success,
        Err(error) if is_failure(error) => Outcome::Failure,
        Err(_) => Outcome::Ignored,
    }
}

/// Admission ticket for one call. Dropping it unsettled (the call future was
/// cancelled or the operation panicked) records nothing but hands back a
/// probe slot.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    probe: bool,
    settled: bool,
}

impl Permit<'_> {
    fn settle(mut self, outcome: Outcome) {
        self.settled = true;
        self.breaker.record(self.generation, self.probe, outcome);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.probe {
            self.breaker
                .record(self.generation, self.probe, Outcome::Ignored);
        }
    }
}

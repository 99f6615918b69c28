//! Circuit breaker for protecting calls to a failing dependency.
//!
//! A breaker starts closed and counts failures. Once the count reaches the
//! threshold it opens and rejects calls without running them. After the
//! recovery timeout the next call is let through as a probe: success closes
//! the circuit, failure opens it again for another recovery period.
//!
//! ## Architecture
//!
//! - [`types`] - States, snapshots and statistics
//! - [`config`] - `CircuitBreakerConfig`
//! - [`transitions`] - Pure next-state functions over a snapshot
//! - [`state`] - `CircuitBreaker`, which owns the snapshot and runs calls
//!
//! ## Example
//!
//! ```rust,no_run
//! use rampart_resilience::circuit::circuit_breaker;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cb = circuit_breaker("payments", 5, Duration::from_secs(30), None)?;
//! let body = cb
//!     .call(|| async { Ok::<_, std::io::Error>("ok".to_string()) })
//!     .await?;
//! # let _ = body;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod state;
#[cfg(test)]
mod tests;
pub mod transitions;
pub mod types;

pub use config::CircuitBreakerConfig;
pub use state::CircuitBreaker;
pub use types::{CircuitBreakerState, CircuitBreakerStats, CircuitState};

use rampart_core::Result;
use std::time::Duration;

/// Build a breaker with the given threshold and recovery timeout and
/// defaults for everything else. `failure_kinds`, when given, limits which
/// error kinds the classified call variants count as failures.
pub fn circuit_breaker(
    name: impl Into<String>,
    failure_threshold: u32,
    recovery_timeout: Duration,
    failure_kinds: Option<&[&str]>,
) -> Result<CircuitBreaker> {
    let mut config = CircuitBreakerConfig::new(failure_threshold, recovery_timeout);
    if let Some(kinds) = failure_kinds {
        config = config.with_failure_kinds(kinds.iter().copied());
    }
    CircuitBreaker::new(name, config)
}

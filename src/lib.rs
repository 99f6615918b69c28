//! Ordered lock coordination and resilience primitives for code that mixes
//! blocking threads with tokio tasks.
//!
//! ## Architecture
//!
//! - [`rampart_core`] - `Error`, `CallError<E>`, `ErrorKind`, caller identity
//! - [`rampart_sync`] - `DualModeLock`, `LockRegistry`, `AsyncLockCoordinator`
//! - [`rampart_resilience`] - circuit breakers, retries, bulkheads, rate limits
//!
//! This crate re-exports all three and adds the composition root: a
//! [`ResilienceConfig`] and the [`Resilience`] context built from it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rampart::{Resilience, ResilienceConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resilience = Resilience::new(ResilienceConfig::default())?;
//!
//! // Standard locks are registered on first use.
//! let _guard = resilience
//!     .coordinator()
//!     .acquire(&["metrics", "config"], Some(Duration::from_secs(1)))
//!     .await?;
//!
//! let breaker = resilience.circuit_breaker("payments")?;
//! let executor = resilience.retry()?;
//! let receipt = executor
//!     .execute(|| breaker.call(|| async { Ok::<_, std::io::Error>("paid") }))
//!     .await?;
//! # let _ = receipt;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod logging;

pub use config::ResilienceConfig;
pub use context::{global, init_global, Resilience, ResilienceStatus};
pub use logging::init_tracing;

pub use rampart_core::{
    CallError, CallerId, Error, ErrorKind, LockDescriptor, Result,
};
pub use rampart_resilience::{
    bulkhead, circuit, circuit_breaker, rate_limit, retry, Backoff, Bulkhead, BulkheadConfig,
    BulkheadManager, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState,
    NoopSleeper, PoolPermit, PoolStatus, RateLimitConfig, RateLimiterStatus, ResourcePool,
    RetryAttempt, RetryExecutor, RetryPolicy, Sleeper, TokenBucketRateLimiter, TokioSleeper,
};
pub use rampart_sync::{
    default_standard_locks, AsyncLockCoordinator, DualModeGuard, DualModeLock, HolderSnapshot,
    LockConfig, LockRegistry, LockSpec, OrderedLock, RegistryGuard, Waitable,
};

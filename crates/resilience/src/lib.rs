//! Failure handling and admission control around operations.
//!
//! ## Key Components
//!
//! - **`circuit`**: `CircuitBreaker`, fails fast while a dependency is down
//!   and probes for its recovery.
//! - **`retry`**: `RetryExecutor`, re-runs transient failures with fixed,
//!   linear or exponential backoff.
//! - **`bulkhead`**: `Bulkhead` and `ResourcePool`, cap concurrent use of a
//!   resource with a bounded wait queue.
//! - **`rate_limit`**: `TokenBucketRateLimiter`.
//!
//! Guards that may refuse a call (`CircuitBreaker`, `Bulkhead`) return
//! `CallError<E>`, so the wrapped operation's own error always comes back
//! unchanged. Guards nest: a bulkhead around a breaker yields
//! `CallError<CallError<E>>`, which `CallError::flatten` collapses.

pub mod bulkhead;
pub mod circuit;
pub mod rate_limit;
pub mod retry;

pub use bulkhead::{Bulkhead, BulkheadConfig, BulkheadManager, PoolPermit, PoolStatus, ResourcePool};
pub use circuit::{
    circuit_breaker, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState,
};
pub use rate_limit::{RateLimitConfig, RateLimiterStatus, TokenBucketRateLimiter};
pub use retry::{
    retry, Backoff, NoopSleeper, RetryAttempt, RetryExecutor, RetryPolicy, Sleeper, TokioSleeper,
};

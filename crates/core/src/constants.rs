//! Default values shared across the rampart primitives

use std::time::Duration;

// Lock coordination
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_DEADLOCK_THRESHOLD: Duration = Duration::from_secs(60);

// Fallback re-check interval for waiters that may have missed a wakeup
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

// Circuit breaker
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_HALF_OPEN_MAX_CALLS: u32 = 1;

// Retry
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

// Bulkhead
pub const DEFAULT_MAX_CONCURRENT: usize = 10;
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 100;
pub const DEFAULT_POOL_TIMEOUT: Duration = Duration::from_secs(30);

// Rate limiting
pub const DEFAULT_BUCKET_CAPACITY: f64 = 10.0;
pub const DEFAULT_REFILL_RATE: f64 = 1.0;

// Registry names used in duplicate-registration errors
pub const LOCK_REGISTRY: &str = "lock";
pub const BULKHEAD_REGISTRY: &str = "bulkhead";
pub const RATE_LIMITER_REGISTRY: &str = "rate limiter";

//! Builder methods for creating errors with context

use super::types::Error;
use std::time::Duration;

impl Error {
    /// Create a duplicate-name registration error
    #[must_use]
    pub fn duplicate_name(registry: impl Into<String>, name: impl Into<String>) -> Self {
        Error::DuplicateName {
            registry: registry.into(),
            name: name.into(),
        }
    }

    /// Create a duplicate-order registration error
    #[must_use]
    pub fn duplicate_order(
        order: u32,
        existing: impl Into<String>,
        requested: impl Into<String>,
    ) -> Self {
        Error::DuplicateOrder {
            order,
            existing: existing.into(),
            requested: requested.into(),
        }
    }

    /// Create an unknown-lock error
    #[must_use]
    pub fn unknown_lock(name: impl Into<String>) -> Self {
        Error::UnknownLock { name: name.into() }
    }

    /// Create a lock order violation
    #[must_use]
    pub fn lock_order_violation(name: impl Into<String>, order: u32, held_order: u32) -> Self {
        Error::LockOrderViolation {
            name: name.into(),
            order,
            held_order,
        }
    }

    /// Create a lock timeout error
    #[must_use]
    pub fn lock_timeout(name: impl Into<String>, waited: Duration) -> Self {
        Error::LockTimeout {
            name: name.into(),
            waited,
        }
    }

    /// Create a not-held error
    #[must_use]
    pub fn not_held(name: impl Into<String>) -> Self {
        Error::NotHeld { name: name.into() }
    }

    /// Create a circuit-open error
    #[must_use]
    pub fn circuit_open(name: impl Into<String>, remaining: Duration) -> Self {
        Error::CircuitOpen {
            name: name.into(),
            remaining,
        }
    }

    /// Create a pool-full error
    #[must_use]
    pub fn pool_full(name: impl Into<String>, max_concurrent: usize, max_queue_size: usize) -> Self {
        Error::PoolFull {
            name: name.into(),
            max_concurrent,
            max_queue_size,
        }
    }

    /// Create a pool-timeout error
    #[must_use]
    pub fn pool_timeout(name: impl Into<String>, waited: Duration) -> Self {
        Error::PoolTimeout {
            name: name.into(),
            waited,
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a rate-limited error
    #[must_use]
    pub fn rate_limited(name: impl Into<String>, waited: Duration) -> Self {
        Error::RateLimited {
            name: name.into(),
            waited,
        }
    }

    /// Create a worker join error
    #[must_use]
    pub fn worker(message: impl Into<String>) -> Self {
        Error::Worker {
            message: message.into(),
        }
    }

    /// Stable name of this error's kind, used for retry classification
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Error::DuplicateName { .. } => "DuplicateName",
            Error::DuplicateOrder { .. } => "DuplicateOrder",
            Error::UnknownLock { .. } => "UnknownLock",
            Error::LockOrderViolation { .. } => "LockOrderViolation",
            Error::LockTimeout { .. } => "LockTimeout",
            Error::NotHeld { .. } => "NotHeld",
            Error::CircuitOpen { .. } => "CircuitOpen",
            Error::PoolFull { .. } => "PoolFull",
            Error::PoolTimeout { .. } => "PoolTimeout",
            Error::RateLimited { .. } => "RateLimited",
            Error::Configuration { .. } => "Configuration",
            Error::Worker { .. } => "Worker",
        }
    }

    /// Whether the condition may clear up on its own
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::LockTimeout { .. }
                | Error::CircuitOpen { .. }
                | Error::PoolFull { .. }
                | Error::PoolTimeout { .. }
                | Error::RateLimited { .. }
        )
    }
}

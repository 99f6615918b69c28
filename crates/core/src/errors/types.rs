//! Core error type definitions

use std::time::Duration;

/// Result type alias for rampart operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors originated by the coordination and resilience primitives themselves.
///
/// A caller's own functional errors are never converted into this type; they
/// travel untouched inside [`CallError::Inner`] or are returned as-is by the
/// retry executor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A name is already registered
    DuplicateName { registry: String, name: String },

    /// A lock order is already taken by another lock
    DuplicateOrder {
        order: u32,
        existing: String,
        requested: String,
    },

    /// A lock name that was never registered
    UnknownLock { name: String },

    /// Locks requested out of ascending order
    LockOrderViolation {
        name: String,
        order: u32,
        held_order: u32,
    },

    /// A lock could not be acquired within its budget
    LockTimeout { name: String, waited: Duration },

    /// Release of a lock the caller does not hold
    NotHeld { name: String },

    /// The circuit is open and the call was not attempted
    CircuitOpen { name: String, remaining: Duration },

    /// Both the active slots and the wait queue of a pool are exhausted
    PoolFull {
        name: String,
        max_concurrent: usize,
        max_queue_size: usize,
    },

    /// Gave up waiting in a pool's queue
    PoolTimeout { name: String, waited: Duration },

    /// No rate limiter token became available within the budget
    RateLimited { name: String, waited: Duration },

    /// Invalid configuration or policy values
    Configuration { message: String },

    /// A task on the blocking pool could not be joined
    Worker { message: String },
}

/// Outcome of a guarded call: either the guard refused to run the operation,
/// or the operation ran and produced its own error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError<E> {
    /// The call was refused before the operation ran (open circuit, full pool, ...)
    Rejected(Error),
    /// The operation's own error, unchanged
    Inner(E),
}

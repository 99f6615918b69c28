//! Display implementations for error types

use super::types::{CallError, Error};
use std::fmt;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicateName { registry, name } => {
                write!(f, "{registry} '{name}' is already registered")
            }
            Error::DuplicateOrder {
                order,
                existing,
                requested,
            } => {
                write!(
                    f,
                    "lock order {order} requested for '{requested}' is already used by '{existing}'"
                )
            }
            Error::UnknownLock { name } => write!(f, "lock '{name}' is not registered"),
            Error::LockOrderViolation {
                name,
                order,
                held_order,
            } => {
                write!(
                    f,
                    "lock order violation: '{name}' (order {order}) requested while holding order {held_order}"
                )
            }
            Error::LockTimeout { name, waited } => {
                write!(f, "timed out after {waited:?} waiting for lock '{name}'")
            }
            Error::NotHeld { name } => write!(f, "lock '{name}' is not held"),
            Error::CircuitOpen { name, remaining } => {
                write!(f, "circuit '{name}' is open, retry after {remaining:?}")
            }
            Error::PoolFull {
                name,
                max_concurrent,
                max_queue_size,
            } => {
                write!(
                    f,
                    "resource pool '{name}' is full ({max_concurrent} active, {max_queue_size} queued)"
                )
            }
            Error::PoolTimeout { name, waited } => {
                write!(f, "timed out after {waited:?} waiting for resource pool '{name}'")
            }
            Error::RateLimited { name, waited } => {
                write!(f, "rate limit '{name}' exceeded, waited {waited:?} for a token")
            }
            Error::Configuration { message } => write!(f, "configuration error: {message}"),
            Error::Worker { message } => write!(f, "blocking worker failed: {message}"),
        }
    }
}

impl<E: fmt::Display> fmt::Display for CallError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Rejected(error) => write!(f, "{error}"),
            CallError::Inner(error) => write!(f, "{error}"),
        }
    }
}

impl<E> std::error::Error for CallError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CallError::Rejected(error) => Some(error),
            CallError::Inner(error) => Some(error),
        }
    }
}

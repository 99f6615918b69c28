//! Extension traits and helpers for error handling

use super::types::{CallError, Error};
use std::borrow::Cow;

/// Names the kind of an error so retry policies can match it against a set
/// of retryable kinds without knowing the concrete type.
pub trait ErrorKind {
    /// Kind name, e.g. `"TimedOut"` for an I/O timeout or `"LockTimeout"`
    fn kind(&self) -> Cow<'_, str>;
}

impl ErrorKind for Error {
    fn kind(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.kind_name())
    }
}

impl ErrorKind for std::io::Error {
    fn kind(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{:?}", std::io::Error::kind(self)))
    }
}

impl<E: ErrorKind> ErrorKind for CallError<E> {
    fn kind(&self) -> Cow<'_, str> {
        match self {
            CallError::Rejected(error) => error.kind(),
            CallError::Inner(error) => error.kind(),
        }
    }
}

impl<E> CallError<E> {
    /// The operation's own error, if the operation ran
    pub fn into_inner(self) -> Option<E> {
        match self {
            CallError::Inner(error) => Some(error),
            CallError::Rejected(_) => None,
        }
    }

    /// The rejection signal, if the call was refused
    pub fn rejection(&self) -> Option<&Error> {
        match self {
            CallError::Rejected(error) => Some(error),
            CallError::Inner(_) => None,
        }
    }

    /// Whether the call was refused before running
    pub fn is_rejected(&self) -> bool {
        matches!(self, CallError::Rejected(_))
    }

    /// Map the inner error, leaving rejections alone
    pub fn map_inner<F, T>(self, f: F) -> CallError<T>
    where
        F: FnOnce(E) -> T,
    {
        match self {
            CallError::Rejected(error) => CallError::Rejected(error),
            CallError::Inner(error) => CallError::Inner(f(error)),
        }
    }
}

impl<E> CallError<CallError<E>> {
    /// Collapse a guard nested inside another guard, e.g. a circuit breaker
    /// call executed inside a bulkhead.
    pub fn flatten(self) -> CallError<E> {
        match self {
            CallError::Rejected(error) | CallError::Inner(CallError::Rejected(error)) => {
                CallError::Rejected(error)
            }
            CallError::Inner(CallError::Inner(error)) => CallError::Inner(error),
        }
    }
}

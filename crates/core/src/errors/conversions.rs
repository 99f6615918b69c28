//! Conversion implementations for error types

use super::types::{CallError, Error};

impl<E> From<Error> for CallError<E> {
    fn from(error: Error) -> Self {
        CallError::Rejected(error)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(error: tokio::task::JoinError) -> Self {
        Error::Worker {
            message: error.to_string(),
        }
    }
}

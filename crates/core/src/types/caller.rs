//! Identity of whoever is currently acquiring or holding a lock

use std::fmt;
use std::thread::ThreadId;

/// The calling context a held-lock stack belongs to.
///
/// Inside a tokio task the task id is used, so a task that migrates between
/// worker threads keeps one identity. Everywhere else the OS thread is the
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallerId {
    Task(tokio::task::Id),
    Thread(ThreadId),
}

impl CallerId {
    /// Identity of the current task, or of the current thread outside a task
    #[must_use]
    pub fn current() -> Self {
        match tokio::task::try_id() {
            Some(id) => CallerId::Task(id),
            None => CallerId::Thread(std::thread::current().id()),
        }
    }

    /// Whether this identity belongs to an async task
    #[must_use]
    pub fn is_task(&self) -> bool {
        matches!(self, CallerId::Task(_))
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallerId::Task(id) => write!(f, "task-{id}"),
            CallerId::Thread(id) => write!(f, "{id:?}"),
        }
    }
}

//! A mutual-exclusion lock shared by blocking threads and async tasks.

use crate::wait::Waitable;
use chrono::{DateTime, Utc};
use rampart_core::{CallerId, Error, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Default)]
struct Holder {
    owner: Option<CallerId>,
    acquired_at: Option<Instant>,
    acquired_wall: Option<DateTime<Utc>>,
}

impl Holder {
    fn try_take(&mut self, caller: CallerId) -> bool {
        if self.owner.is_some() {
            return false;
        }
        self.owner = Some(caller);
        self.acquired_at = Some(Instant::now());
        self.acquired_wall = Some(Utc::now());
        true
    }
}

/// Holder details read under one lock, so they always agree with each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HolderSnapshot {
    pub owner: Option<CallerId>,
    pub acquired_at: Option<DateTime<Utc>>,
    pub held_for: Option<Duration>,
}

/// One logical lock that blocking and async code can both take.
///
/// A thread holding the lock blocks tasks and vice versa. Async acquisition
/// suspends the task instead of parking a runtime worker; blocking work that
/// must run under the lock from async code goes through [`run_blocking`],
/// which hands it to tokio's blocking pool.
///
/// The lock is not re-entrant.
///
/// [`run_blocking`]: DualModeLock::run_blocking
pub struct DualModeLock {
    name: String,
    core: Waitable<Holder>,
}

impl DualModeLock {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            core: Waitable::new(Holder::default()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block the current thread until the lock is free or `timeout` elapses
    pub fn lock_blocking(self: &Arc<Self>, timeout: Option<Duration>) -> Result<DualModeGuard> {
        let caller = CallerId::current();
        self.core
            .wait_blocking(timeout, |holder| holder.try_take(caller).then_some(()))
            .map(|()| self.guard(caller))
            .ok_or_else(|| self.timed_out(timeout))
    }

    /// Take the lock only if it is free right now
    pub fn try_lock(self: &Arc<Self>) -> Result<DualModeGuard> {
        let caller = CallerId::current();
        if self.core.lock().try_take(caller) {
            Ok(self.guard(caller))
        } else {
            Err(Error::lock_timeout(&self.name, Duration::ZERO))
        }
    }

    /// Suspend the current task until the lock is free or `timeout` elapses.
    ///
    /// Cancelling the returned future before it completes never leaves the
    /// lock held.
    pub async fn lock_async(self: &Arc<Self>, timeout: Option<Duration>) -> Result<DualModeGuard> {
        let caller = CallerId::current();
        match self
            .core
            .wait_async(timeout, |holder| holder.try_take(caller).then_some(()))
            .await
        {
            Some(()) => Ok(self.guard(caller)),
            None => Err(self.timed_out(timeout)),
        }
    }

    /// Acquire from async code, then run `work` on the blocking pool while
    /// the lock is held. The lock is released when `work` returns or panics.
    pub async fn run_blocking<F, T>(self: &Arc<Self>, timeout: Option<Duration>, work: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let guard = self.lock_async(timeout).await?;
        let output = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            work()
        })
        .await?;
        Ok(output)
    }

    pub fn is_locked(&self) -> bool {
        self.core.lock().owner.is_some()
    }

    pub fn owner(&self) -> Option<CallerId> {
        self.core.lock().owner
    }

    pub fn acquired_at(&self) -> Option<DateTime<Utc>> {
        self.core.lock().acquired_wall
    }

    /// How long the current holder has had the lock
    pub fn held_for(&self) -> Option<Duration> {
        self.core.lock().acquired_at.map(|at| at.elapsed())
    }

    /// Owner, acquisition time and hold time from a single read
    pub fn holder_snapshot(&self) -> HolderSnapshot {
        let holder = self.core.lock();
        HolderSnapshot {
            owner: holder.owner,
            acquired_at: holder.acquired_wall,
            held_for: holder.acquired_at.map(|at| at.elapsed()),
        }
    }

    fn guard(self: &Arc<Self>, owner: CallerId) -> DualModeGuard {
        tracing::trace!(lock = %self.name, %owner, "lock acquired");
        DualModeGuard {
            lock: Arc::clone(self),
            owner,
            released: false,
        }
    }

    fn timed_out(&self, timeout: Option<Duration>) -> Error {
        let waited = timeout.unwrap_or_default();
        tracing::debug!(lock = %self.name, ?waited, "lock acquisition timed out");
        Error::lock_timeout(&self.name, waited)
    }

    fn release(&self, owner: CallerId) -> Result<()> {
        {
            let mut holder = self.core.lock();
            if holder.owner.is_none() {
                return Err(Error::not_held(&self.name));
            }
            *holder = Holder::default();
        }
        tracing::trace!(lock = %self.name, %owner, "lock released");
        self.core.notify_one();
        Ok(())
    }
}

impl fmt::Debug for DualModeLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DualModeLock")
            .field("name", &self.name)
            .field("owner", &self.owner())
            .finish()
    }
}

/// Holds a [`DualModeLock`] until dropped or explicitly released.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct DualModeGuard {
    lock: Arc<DualModeLock>,
    owner: CallerId,
    released: bool,
}

impl DualModeGuard {
    /// Identity that acquired the lock
    pub fn owner(&self) -> CallerId {
        self.owner
    }

    pub fn lock(&self) -> &Arc<DualModeLock> {
        &self.lock
    }

    /// Release now, reporting a failure instead of logging it
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.lock.release(self.owner)
    }
}

impl Drop for DualModeGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(error) = self.lock.release(self.owner) {
            tracing::warn!(lock = %self.lock.name, %error, "failed to release lock");
        }
    }
}

impl fmt::Debug for DualModeGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DualModeGuard")
            .field("lock", &self.lock.name)
            .field("owner", &self.owner)
            .finish()
    }
}

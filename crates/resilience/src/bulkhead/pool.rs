//! Counting admission pool shared by blocking threads and async tasks.
//!
//! A caller is admitted straight away while fewer than `max_concurrent`
//! operations are active. Otherwise it joins the queue, if the queue has
//! room, and waits for a release; if the queue is full it is turned away
//! with `PoolFull` without waiting at all.
//!
//! Queued callers are not served in strict arrival order: whoever
//! re-checks first after a release takes the slot.

use super::config::BulkheadConfig;
use rampart_core::{Error, Result};
use rampart_sync::Waitable;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct PoolState {
    active: usize,
    queued: usize,
}

/// Point-in-time view of a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub name: String,
    pub active: usize,
    pub queued: usize,
    pub max_concurrent: usize,
    pub max_queue_size: usize,
    pub available: usize,
}

struct PoolInner {
    name: String,
    config: BulkheadConfig,
    core: Waitable<PoolState>,
}

/// Admission outcome decided under the pool lock
enum Entry {
    Admitted,
    Queued,
}

#[derive(Clone)]
pub struct ResourcePool {
    inner: Arc<PoolInner>,
}

impl ResourcePool {
    pub fn new(name: impl Into<String>, config: BulkheadConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(PoolInner {
                name: name.into(),
                config,
                core: Waitable::new(PoolState::default()),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &BulkheadConfig {
        &self.inner.config
    }

    /// Wait for a slot from async code. `None` uses the configured timeout.
    ///
    /// Dropping the future while queued gives the queue position back.
    pub async fn acquire(&self, timeout: Option<Duration>) -> Result<PoolPermit> {
        if let Entry::Admitted = self.enter()? {
            return Ok(self.permit());
        }
        let ticket = QueueTicket::new(&self.inner);
        let budget = timeout.unwrap_or(self.inner.config.timeout);
        let admitted = self
            .inner
            .core
            .wait_async(Some(budget), |state| self.promote(state))
            .await;
        self.finish_wait(ticket, admitted, budget)
    }

    /// Wait for a slot by blocking the current thread
    pub fn acquire_blocking(&self, timeout: Option<Duration>) -> Result<PoolPermit> {
        if let Entry::Admitted = self.enter()? {
            return Ok(self.permit());
        }
        let ticket = QueueTicket::new(&self.inner);
        let budget = timeout.unwrap_or(self.inner.config.timeout);
        let admitted = self
            .inner
            .core
            .wait_blocking(Some(budget), |state| self.promote(state));
        self.finish_wait(ticket, admitted, budget)
    }

    /// Take a slot only if one is free right now. Never queues.
    pub fn try_acquire(&self) -> Result<PoolPermit> {
        let config = &self.inner.config;
        let mut state = self.inner.core.lock();
        if state.active < config.max_concurrent {
            state.active += 1;
            drop(state);
            return Ok(self.permit());
        }
        if state.queued >= config.max_queue_size {
            return Err(self.full());
        }
        Err(Error::pool_timeout(&self.inner.name, Duration::ZERO))
    }

    pub fn get_status(&self) -> PoolStatus {
        let config = &self.inner.config;
        let state = self.inner.core.lock();
        PoolStatus {
            name: self.inner.name.clone(),
            active: state.active,
            queued: state.queued,
            max_concurrent: config.max_concurrent,
            max_queue_size: config.max_queue_size,
            available: config.max_concurrent.saturating_sub(state.active),
        }
    }

    fn enter(&self) -> Result<Entry> {
        let config = &self.inner.config;
        let mut state = self.inner.core.lock();
        if state.active < config.max_concurrent {
            state.active += 1;
            return Ok(Entry::Admitted);
        }
        if state.queued >= config.max_queue_size {
            tracing::debug!(
                pool = %self.inner.name,
                active = state.active,
                queued = state.queued,
                "pool full, rejecting"
            );
            return Err(self.full());
        }
        state.queued += 1;
        tracing::trace!(pool = %self.inner.name, queued = state.queued, "queued for slot");
        Ok(Entry::Queued)
    }

    fn promote(&self, state: &mut PoolState) -> Option<()> {
        if state.active < self.inner.config.max_concurrent {
            state.active += 1;
            state.queued -= 1;
            Some(())
        } else {
            None
        }
    }

    fn finish_wait(
        &self,
        ticket: QueueTicket<'_>,
        admitted: Option<()>,
        budget: Duration,
    ) -> Result<PoolPermit> {
        match admitted {
            Some(()) => {
                ticket.promoted();
                Ok(self.permit())
            }
            None => {
                drop(ticket);
                // A wakeup this waiter swallowed may belong to someone else.
                self.inner.core.notify_one();
                tracing::debug!(pool = %self.inner.name, ?budget, "timed out waiting for slot");
                Err(Error::pool_timeout(&self.inner.name, budget))
            }
        }
    }

    fn permit(&self) -> PoolPermit {
        tracing::trace!(pool = %self.inner.name, "slot acquired");
        PoolPermit {
            inner: Arc::clone(&self.inner),
        }
    }

    fn full(&self) -> Error {
        Error::pool_full(
            &self.inner.name,
            self.inner.config.max_concurrent,
            self.inner.config.max_queue_size,
        )
    }
}

impl fmt::Debug for ResourcePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePool")
            .field("name", &self.inner.name)
            .field("config", &self.inner.config)
            .finish()
    }
}

/// Holds one queue position until the caller is promoted to active.
/// Dropped unpromoted (timeout, cancellation, panic), it gives the position
/// back.
struct QueueTicket<'a> {
    inner: &'a PoolInner,
    promoted: bool,
}

impl<'a> QueueTicket<'a> {
    fn new(inner: &'a Arc<PoolInner>) -> Self {
        Self {
            inner,
            promoted: false,
        }
    }

    fn promoted(mut self) {
        self.promoted = true;
    }
}

impl Drop for QueueTicket<'_> {
    fn drop(&mut self) {
        if !self.promoted {
            let mut state = self.inner.core.lock();
            state.queued = state.queued.saturating_sub(1);
        }
    }
}

/// One active slot in a [`ResourcePool`], released on drop
#[must_use = "the slot is released as soon as the permit is dropped"]
pub struct PoolPermit {
    inner: Arc<PoolInner>,
}

impl PoolPermit {
    pub fn pool_name(&self) -> &str {
        &self.inner.name
    }
}

impl Drop for PoolPermit {
    fn drop(&mut self) {
        {
            let mut state = self.inner.core.lock();
            state.active = state.active.saturating_sub(1);
        }
        tracing::trace!(pool = %self.inner.name, "slot released");
        self.inner.core.notify_one();
    }
}

impl fmt::Debug for PoolPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolPermit")
            .field("pool", &self.inner.name)
            .finish()
    }
}

//! Named locks with a total acquisition order.
//!
//! Every lock is registered with a unique integer order. A caller may only
//! request locks whose orders are all greater than anything it already holds,
//! and a multi-lock request is always satisfied in ascending order. With
//! those two rules no cycle of waiters can form, so deadlock is impossible
//! among registry locks; an out-of-order request fails immediately with
//! [`Error::LockOrderViolation`] instead of waiting.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use rampart_sync::LockRegistry;
//! use std::time::Duration;
//!
//! # fn example() -> rampart_core::Result<()> {
//! let registry = LockRegistry::default();
//! registry.register("config", 10, "configuration snapshot")?;
//! registry.register("metrics", 20, "shared counters")?;
//!
//! // Locked as config, then metrics, whatever order the names are given in.
//! let guard = registry.acquire(&["metrics", "config"], Some(Duration::from_secs(1)))?;
//! assert_eq!(guard.locked_names(), vec!["config", "metrics"]);
//! # Ok(())
//! # }
//! ```

mod guard;
mod held;
mod lock;
#[cfg(test)]
mod tests;

pub use guard::RegistryGuard;
pub use lock::OrderedLock;

use crate::config::LockConfig;
use crate::dual_mode::DualModeGuard;
use guard::release_all;
use held::HeldOrders;
use parking_lot::RwLock;
use rampart_core::{CallerId, Error, LockDescriptor, Result, LOCK_REGISTRY};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Registry of ordered locks. Cloning shares the same registry.
#[derive(Debug, Clone, Default)]
pub struct LockRegistry {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    config: LockConfig,
    locks: RwLock<HashMap<String, Arc<OrderedLock>>>,
    held: Arc<HeldOrders>,
}

impl LockRegistry {
    pub fn new(config: LockConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                locks: RwLock::new(HashMap::new()),
                held: Arc::new(HeldOrders::default()),
            }),
        }
    }

    pub fn config(&self) -> &LockConfig {
        &self.inner.config
    }

    /// Register a lock. Fails without touching existing registrations if the
    /// name or the order is already taken.
    pub fn register(
        &self,
        name: impl Into<String>,
        order: u32,
        description: impl Into<String>,
    ) -> Result<Arc<OrderedLock>> {
        let name = name.into();
        let mut locks = self.inner.locks.write();

        if locks.contains_key(&name) {
            return Err(Error::duplicate_name(LOCK_REGISTRY, name));
        }
        if let Some(existing) = locks.values().find(|lock| lock.order() == order) {
            return Err(Error::duplicate_order(order, existing.name(), name));
        }

        let lock = Arc::new(OrderedLock::new(name.clone(), order, description.into()));
        locks.insert(name, Arc::clone(&lock));
        tracing::debug!(lock = lock.name(), order, "registered lock");
        Ok(lock)
    }

    /// Remove a registration. Guards already holding the lock keep it until
    /// they are dropped.
    pub fn unregister(&self, name: &str) -> Result<Arc<OrderedLock>> {
        let removed = self.inner.locks.write().remove(name);
        match removed {
            Some(lock) => {
                tracing::debug!(lock = name, "unregistered lock");
                Ok(lock)
            }
            None => Err(Error::unknown_lock(name)),
        }
    }

    /// Drop every registration
    pub fn reset(&self) {
        let mut locks = self.inner.locks.write();
        tracing::debug!(count = locks.len(), "resetting lock registry");
        locks.clear();
    }

    pub fn get(&self, name: &str) -> Option<Arc<OrderedLock>> {
        self.inner.locks.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.locks.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.inner.locks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.locks.read().is_empty()
    }

    /// Orders held by the calling thread or task
    pub fn held_orders(&self) -> Vec<u32> {
        self.inner.held.orders(CallerId::current())
    }

    /// Acquire the named locks, blocking the current thread for at most
    /// `timeout` in total (the configured default when `None`).
    ///
    /// If any lock cannot be taken within the remaining budget, the locks
    /// taken so far in this call are released and [`Error::LockTimeout`] is
    /// returned.
    pub fn acquire(&self, names: &[&str], timeout: Option<Duration>) -> Result<RegistryGuard> {
        let budget = timeout.unwrap_or(self.inner.config.default_timeout);
        let (caller, plan) = self.plan(names)?;
        let deadline = std::time::Instant::now().checked_add(budget);

        let mut held = Vec::with_capacity(plan.len());
        for lock in plan {
            let remaining =
                deadline.map(|deadline| deadline.saturating_duration_since(std::time::Instant::now()));
            let acquired = lock.inner().lock_blocking(remaining);
            match acquired {
                Ok(guard) => held.push((lock, guard)),
                Err(error) => return Err(self.abandon(&mut held, &lock, budget, error)),
            }
        }
        Ok(RegistryGuard::new(caller, Arc::clone(&self.inner.held), held))
    }

    /// Acquire the named locks only if all of them are free right now
    pub fn try_acquire(&self, names: &[&str]) -> Result<RegistryGuard> {
        let (caller, plan) = self.plan(names)?;

        let mut held = Vec::with_capacity(plan.len());
        for lock in plan {
            let acquired = lock.inner().try_lock();
            match acquired {
                Ok(guard) => held.push((lock, guard)),
                Err(error) => return Err(self.abandon(&mut held, &lock, Duration::ZERO, error)),
            }
        }
        Ok(RegistryGuard::new(caller, Arc::clone(&self.inner.held), held))
    }

    /// Async counterpart of [`acquire`](Self::acquire): waits by suspending
    /// the task. Cancelling the future releases anything taken so far.
    pub async fn acquire_async(
        &self,
        names: &[&str],
        timeout: Option<Duration>,
    ) -> Result<RegistryGuard> {
        let budget = timeout.unwrap_or(self.inner.config.default_timeout);
        let (caller, plan) = self.plan(names)?;
        let deadline = tokio::time::Instant::now().checked_add(budget);

        // Guards already taken live in `held`; if this future is dropped
        // mid-way they are dropped with it and release their locks.
        let mut held = Vec::with_capacity(plan.len());
        for lock in plan {
            let remaining =
                deadline.map(|deadline| deadline.saturating_duration_since(tokio::time::Instant::now()));
            let acquired = lock.inner().lock_async(remaining).await;
            match acquired {
                Ok(guard) => held.push((lock, guard)),
                Err(error) => return Err(self.abandon(&mut held, &lock, budget, error)),
            }
        }
        Ok(RegistryGuard::new(caller, Arc::clone(&self.inner.held), held))
    }

    /// Snapshot of every registered lock, ascending by order
    pub fn get_lock_status(&self) -> Vec<LockDescriptor> {
        let mut status: Vec<_> = self
            .inner
            .locks
            .read()
            .values()
            .map(|lock| lock.describe())
            .collect();
        status.sort_by_key(|descriptor| descriptor.order);
        status
    }

    /// Advisory warnings for locks held longer than `threshold` (the
    /// configured deadlock threshold when `None`). This is a heuristic: a
    /// long hold is suspicious, not proof of a deadlock.
    pub fn detect_potential_deadlocks(&self, threshold: Option<Duration>) -> Vec<String> {
        let threshold = threshold.unwrap_or(self.inner.config.deadlock_threshold);
        let warnings: Vec<String> = self
            .get_lock_status()
            .into_iter()
            .filter_map(|descriptor| {
                let held_for = descriptor.held_for?;
                (held_for > threshold).then(|| {
                    format!(
                        "lock '{}' (order {}) held by {} for {:?}, longer than {:?}",
                        descriptor.name,
                        descriptor.order,
                        descriptor.owner.as_deref().unwrap_or("unknown"),
                        held_for,
                        threshold
                    )
                })
            })
            .collect();

        for warning in &warnings {
            tracing::warn!("{warning}");
        }
        warnings
    }

    /// Resolve, de-duplicate and order the requested locks, rejecting the
    /// request if it would violate the ascending-order rule.
    fn plan(&self, names: &[&str]) -> Result<(CallerId, Vec<Arc<OrderedLock>>)> {
        let caller = CallerId::current();
        let mut plan = {
            let locks = self.inner.locks.read();
            names
                .iter()
                .map(|name| {
                    locks
                        .get(*name)
                        .cloned()
                        .ok_or_else(|| Error::unknown_lock(*name))
                })
                .collect::<Result<Vec<_>>>()?
        };
        plan.sort_by_key(|lock| lock.order());
        plan.dedup_by_key(|lock| lock.order());

        if let (Some(held_order), Some(lowest)) = (self.inner.held.highest(caller), plan.first()) {
            if lowest.order() <= held_order {
                tracing::warn!(
                    lock = lowest.name(),
                    order = lowest.order(),
                    held_order,
                    %caller,
                    "lock order violation"
                );
                return Err(Error::lock_order_violation(
                    lowest.name(),
                    lowest.order(),
                    held_order,
                ));
            }
        }
        Ok((caller, plan))
    }

    /// Roll back a partially satisfied request
    fn abandon(
        &self,
        held: &mut Vec<(Arc<OrderedLock>, DualModeGuard)>,
        failed: &OrderedLock,
        budget: Duration,
        error: Error,
    ) -> Error {
        let released = release_all(held);
        tracing::warn!(
            lock = failed.name(),
            released = released.len(),
            ?budget,
            "could not acquire lock, released partial set"
        );
        match error {
            Error::LockTimeout { .. } => Error::lock_timeout(failed.name(), budget),
            other => other,
        }
    }
}

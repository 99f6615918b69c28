//! Scoped ownership of a set of registry locks.

use super::held::HeldOrders;
use super::lock::OrderedLock;
use crate::dual_mode::DualModeGuard;
use rampart_core::CallerId;
use std::fmt;
use std::sync::Arc;

/// Holds every lock taken by one registry acquisition.
///
/// Dropping the guard releases the locks in reverse acquisition order. A
/// failure to release one lock is logged and the remaining locks are still
/// released.
#[must_use = "the locks are released as soon as the guard is dropped"]
pub struct RegistryGuard {
    caller: CallerId,
    held_orders: Arc<HeldOrders>,
    held: Vec<(Arc<OrderedLock>, DualModeGuard)>,
}

impl RegistryGuard {
    pub(crate) fn new(
        caller: CallerId,
        held_orders: Arc<HeldOrders>,
        held: Vec<(Arc<OrderedLock>, DualModeGuard)>,
    ) -> Self {
        held_orders.push(caller, held.iter().map(|(lock, _)| lock.order()));
        Self {
            caller,
            held_orders,
            held,
        }
    }

    /// Names of the held locks, in the order they were acquired
    pub fn locked_names(&self) -> Vec<&str> {
        self.held.iter().map(|(lock, _)| lock.name()).collect()
    }

    /// Orders of the held locks, ascending
    pub fn orders(&self) -> Vec<u32> {
        self.held.iter().map(|(lock, _)| lock.order()).collect()
    }

    pub fn caller(&self) -> CallerId {
        self.caller
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

/// Release locks acquired so far in reverse order, logging failures.
pub(crate) fn release_all(held: &mut Vec<(Arc<OrderedLock>, DualModeGuard)>) -> Vec<u32> {
    let mut released = Vec::with_capacity(held.len());
    while let Some((lock, guard)) = held.pop() {
        if let Err(error) = guard.release() {
            tracing::warn!(lock = lock.name(), %error, "failed to release registry lock");
        }
        released.push(lock.order());
    }
    released
}

impl Drop for RegistryGuard {
    fn drop(&mut self) {
        for order in release_all(&mut self.held) {
            self.held_orders.remove(self.caller, order);
        }
    }
}

impl fmt::Debug for RegistryGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryGuard")
            .field("caller", &self.caller)
            .field("locks", &self.locked_names())
            .finish()
    }
}

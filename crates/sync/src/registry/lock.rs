//! A named lock with its place in the global acquisition order.

use crate::dual_mode::DualModeLock;
use rampart_core::LockDescriptor;
use std::sync::Arc;

#[derive(Debug)]
pub struct OrderedLock {
    name: String,
    order: u32,
    description: String,
    lock: Arc<DualModeLock>,
}

impl OrderedLock {
    pub(crate) fn new(name: String, order: u32, description: String) -> Self {
        let lock = DualModeLock::new(name.clone());
        Self {
            name,
            order,
            description,
            lock,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    /// Only the registry hands the underlying lock out, so every acquisition
    /// goes through the ordering check.
    pub(crate) fn inner(&self) -> &Arc<DualModeLock> {
        &self.lock
    }

    pub fn describe(&self) -> LockDescriptor {
        let holder = self.lock.holder_snapshot();
        LockDescriptor {
            name: self.name.clone(),
            order: self.order,
            description: self.description.clone(),
            owner: holder.owner.map(|owner| owner.to_string()),
            acquired_at: holder.acquired_at,
            held_for: holder.held_for,
        }
    }
}

//! Async-side entry point to the lock registry with lazy, once-only setup.
//!
//! Many subsystems start concurrently and all want the standard locks to
//! exist before their first acquisition. The coordinator registers them on
//! first use: the first caller runs the registration, concurrent callers
//! wait on the same initialization cell, and everyone afterwards sees the
//! finished registry.
//!
//! Registration is all-or-nothing. If one standard lock fails to register,
//! the ones registered earlier in the same attempt are unregistered again
//! before the error is returned, so the next caller can retry from a clean
//! slate instead of tripping over "already registered".

use crate::config::{default_standard_locks, LockSpec};
use crate::registry::{LockRegistry, OrderedLock, RegistryGuard};
use rampart_core::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

#[derive(Debug)]
pub struct AsyncLockCoordinator {
    registry: LockRegistry,
    standard_locks: Vec<LockSpec>,
    initialized: OnceCell<()>,
    attempts: AtomicUsize,
}

impl AsyncLockCoordinator {
    /// Coordinator over `registry` that registers the default standard locks
    pub fn new(registry: LockRegistry) -> Self {
        Self::with_standard_locks(registry, default_standard_locks())
    }

    pub fn with_standard_locks(registry: LockRegistry, standard_locks: Vec<LockSpec>) -> Self {
        Self {
            registry,
            standard_locks,
            initialized: OnceCell::new(),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn registry(&self) -> &LockRegistry {
        &self.registry
    }

    pub fn standard_locks(&self) -> &[LockSpec] {
        &self.standard_locks
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    /// How many times registration of the standard locks has been attempted
    pub fn initialization_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Register the standard locks if no caller has done so yet
    pub async fn ensure_initialized(&self) -> Result<()> {
        self.initialized
            .get_or_try_init(|| async { self.register_standard_locks() })
            .await
            .map(|_| ())
    }

    /// Register an additional lock once the standard set is in place
    pub async fn register(
        &self,
        name: impl Into<String>,
        order: u32,
        description: impl Into<String>,
    ) -> Result<Arc<OrderedLock>> {
        self.ensure_initialized().await?;
        self.registry.register(name, order, description)
    }

    /// Acquire registry locks from async code, initializing first if needed
    pub async fn acquire(&self, names: &[&str], timeout: Option<Duration>) -> Result<RegistryGuard> {
        self.ensure_initialized().await?;
        self.registry.acquire_async(names, timeout).await
    }

    // Runs synchronously under the registry's write lock per entry, so a
    // compensation list is enough to undo a partial attempt.
    fn register_standard_locks(&self) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let mut registered: Vec<&str> = Vec::with_capacity(self.standard_locks.len());

        for spec in &self.standard_locks {
            if let Err(error) = self
                .registry
                .register(spec.name.clone(), spec.order, spec.description.clone())
            {
                for name in registered.iter().rev() {
                    if let Err(rollback_error) = self.registry.unregister(name) {
                        tracing::warn!(lock = *name, %rollback_error, "rollback failed");
                    }
                }
                tracing::warn!(
                    attempt,
                    lock = %spec.name,
                    rolled_back = registered.len(),
                    %error,
                    "standard lock registration failed"
                );
                return Err(error);
            }
            registered.push(&spec.name);
        }

        tracing::info!(
            attempt,
            count = registered.len(),
            "standard locks registered"
        );
        Ok(())
    }
}

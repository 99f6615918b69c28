//! Bulkheads: cap how many operations use a resource at once.
//!
//! A [`Bulkhead`] runs operations through a [`ResourcePool`]; the
//! [`BulkheadManager`] keeps named bulkheads so unrelated subsystems cannot
//! starve each other.

pub mod config;
pub mod manager;
pub mod pool;

pub use config::BulkheadConfig;
pub use manager::BulkheadManager;
pub use pool::{PoolPermit, PoolStatus, ResourcePool};

use rampart_core::{CallError, Result};
use std::future::Future;
use std::time::Duration;

/// Named admission control around a [`ResourcePool`]
#[derive(Debug, Clone)]
pub struct Bulkhead {
    pool: ResourcePool,
}

impl Bulkhead {
    pub fn new(name: impl Into<String>, config: BulkheadConfig) -> Result<Self> {
        Ok(Self {
            pool: ResourcePool::new(name, config)?,
        })
    }

    pub fn name(&self) -> &str {
        self.pool.name()
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    /// Run `operation` once a slot is free, waiting at most the configured
    /// timeout. The slot is held until the operation's future completes or
    /// is dropped.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> std::result::Result<T, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        self.execute_within(None, operation).await
    }

    /// [`execute`](Self::execute) with an explicit wait budget
    pub async fn execute_within<F, Fut, T, E>(
        &self,
        timeout: Option<Duration>,
        operation: F,
    ) -> std::result::Result<T, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let _permit = self.pool.acquire(timeout).await?;
        operation().await.map_err(CallError::Inner)
    }

    /// Blocking counterpart of [`execute`](Self::execute)
    pub fn execute_blocking<F, T, E>(&self, operation: F) -> std::result::Result<T, CallError<E>>
    where
        F: FnOnce() -> std::result::Result<T, E>,
    {
        let _permit = self.pool.acquire_blocking(None)?;
        operation().map_err(CallError::Inner)
    }

    pub fn get_status(&self) -> PoolStatus {
        self.pool.get_status()
    }
}

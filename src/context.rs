//! The composition root: one object owning every named primitive.

use crate::config::ResilienceConfig;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use rampart_core::{Error, LockDescriptor, Result, RATE_LIMITER_REGISTRY};
use rampart_resilience::{
    retry, BulkheadManager, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats,
    PoolStatus, RateLimitConfig, RateLimiterStatus, RetryExecutor, TokenBucketRateLimiter,
};
use rampart_sync::{AsyncLockCoordinator, LockRegistry};
use serde::Serialize;
use std::sync::Arc;

/// Owns the lock registry, its coordinator, and the named breakers,
/// bulkheads and rate limiters of one application.
///
/// Subsystems should receive a `&Resilience` (or the individual pieces)
/// from whoever builds it instead of reaching for [`global`].
#[derive(Debug)]
pub struct Resilience {
    config: ResilienceConfig,
    registry: LockRegistry,
    coordinator: AsyncLockCoordinator,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    bulkheads: BulkheadManager,
    rate_limiters: DashMap<String, Arc<TokenBucketRateLimiter>>,
}

/// Everything [`Resilience::status`] reports
#[derive(Debug, Clone, Serialize)]
pub struct ResilienceStatus {
    pub locks: Vec<LockDescriptor>,
    pub circuit_breakers: Vec<CircuitBreakerStats>,
    pub bulkheads: Vec<PoolStatus>,
    pub rate_limiters: Vec<RateLimiterStatus>,
}

impl Resilience {
    /// Validate `config` and create every named primitive it lists
    pub fn new(config: ResilienceConfig) -> Result<Self> {
        config.validate()?;
        let context = Self::unpopulated(config);

        for (name, breaker) in &context.config.circuit_breakers {
            let breaker = CircuitBreaker::new(name.clone(), breaker.clone())?;
            context.breakers.insert(name.clone(), Arc::new(breaker));
        }
        for (name, bulkhead) in &context.config.bulkheads {
            context.bulkheads.create_bulkhead(name.clone(), bulkhead.clone())?;
        }
        for (name, limit) in &context.config.rate_limits {
            let limiter = TokenBucketRateLimiter::with_config(name.clone(), limit.clone())?;
            context.rate_limiters.insert(name.clone(), Arc::new(limiter));
        }

        tracing::debug!(
            circuit_breakers = context.breakers.len(),
            bulkheads = context.bulkheads.len(),
            rate_limiters = context.rate_limiters.len(),
            "resilience context ready"
        );
        Ok(context)
    }

    fn unpopulated(config: ResilienceConfig) -> Self {
        let registry = LockRegistry::new(config.locks.clone());
        let coordinator =
            AsyncLockCoordinator::with_standard_locks(registry.clone(), config.standard_locks.clone());
        Self {
            config,
            registry,
            coordinator,
            breakers: DashMap::new(),
            bulkheads: BulkheadManager::new(),
            rate_limiters: DashMap::new(),
        }
    }

    pub fn config(&self) -> &ResilienceConfig {
        &self.config
    }

    pub fn registry(&self) -> &LockRegistry {
        &self.registry
    }

    pub fn coordinator(&self) -> &AsyncLockCoordinator {
        &self.coordinator
    }

    pub fn bulkheads(&self) -> &BulkheadManager {
        &self.bulkheads
    }

    /// Breaker for `name`, created with the default breaker config on first
    /// request
    pub fn circuit_breaker(&self, name: &str) -> Result<Arc<CircuitBreaker>> {
        self.circuit_breaker_with(name, self.config.default_circuit_breaker.clone())
    }

    /// Breaker for `name`, created with `config` if it does not exist yet.
    /// An existing breaker is returned unchanged.
    pub fn circuit_breaker_with(
        &self,
        name: &str,
        config: CircuitBreakerConfig,
    ) -> Result<Arc<CircuitBreaker>> {
        if let Some(existing) = self.breakers.get(name) {
            return Ok(Arc::clone(existing.value()));
        }
        match self.breakers.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(slot) => {
                let breaker = Arc::new(CircuitBreaker::new(name, config)?);
                slot.insert(Arc::clone(&breaker));
                Ok(breaker)
            }
        }
    }

    /// A retry executor for the configured policy
    pub fn retry(&self) -> Result<RetryExecutor> {
        retry(self.config.retry.clone())
    }

    pub fn rate_limiter(&self, name: &str) -> Option<Arc<TokenBucketRateLimiter>> {
        self.rate_limiters
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Register a new named rate limiter
    pub fn add_rate_limiter(
        &self,
        name: impl Into<String>,
        config: RateLimitConfig,
    ) -> Result<Arc<TokenBucketRateLimiter>> {
        let name = name.into();
        match self.rate_limiters.entry(name.clone()) {
            Entry::Occupied(_) => Err(Error::duplicate_name(RATE_LIMITER_REGISTRY, name)),
            Entry::Vacant(slot) => {
                let limiter = Arc::new(TokenBucketRateLimiter::with_config(name, config)?);
                slot.insert(Arc::clone(&limiter));
                Ok(limiter)
            }
        }
    }

    /// Snapshot of every primitive, each list sorted by name
    pub fn status(&self) -> ResilienceStatus {
        let mut circuit_breakers: Vec<_> =
            self.breakers.iter().map(|entry| entry.value().stats()).collect();
        circuit_breakers.sort_by(|a, b| a.name.cmp(&b.name));

        let mut rate_limiters: Vec<_> = self
            .rate_limiters
            .iter()
            .map(|entry| entry.value().status())
            .collect();
        rate_limiters.sort_by(|a, b| a.name.cmp(&b.name));

        ResilienceStatus {
            locks: self.registry.get_lock_status(),
            circuit_breakers,
            bulkheads: self.bulkheads.status_all(),
            rate_limiters,
        }
    }
}

static GLOBAL: OnceCell<Resilience> = OnceCell::new();

/// Install the process-wide context. Fails if it already exists, including
/// when [`global`] has already created the default one.
pub fn init_global(config: ResilienceConfig) -> Result<&'static Resilience> {
    let context = Resilience::new(config)?;
    GLOBAL
        .set(context)
        .map_err(|_| Error::configuration("the global resilience context is already initialized"))?;
    Ok(global())
}

/// The process-wide context, created with the default configuration if
/// [`init_global`] was never called. Meant for the composition root only.
pub fn global() -> &'static Resilience {
    // The default configuration names no primitives, so nothing can fail.
    GLOBAL.get_or_init(|| Resilience::unpopulated(ResilienceConfig::default()))
}

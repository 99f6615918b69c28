//! Aggregate configuration for a [`Resilience`](crate::Resilience) context.
//!
//! Everything deserializes with defaults for missing fields and durations
//! in milliseconds, so a caller can load it from whatever format it already
//! uses:
//!
//! ```json
//! {
//!   "locks": { "default_timeout": 5000 },
//!   "circuit_breakers": { "payments": { "failure_threshold": 3, "recovery_timeout": 30000 } },
//!   "bulkheads": { "db": { "max_concurrent": 8, "max_queue_size": 32 } },
//!   "rate_limits": { "api": { "capacity": 20.0, "refill_rate": 5.0 } }
//! }
//! ```

use rampart_core::{Error, Result};
use rampart_resilience::{BulkheadConfig, CircuitBreakerConfig, RateLimitConfig, RetryPolicy};
use rampart_sync::{default_standard_locks, LockConfig, LockSpec};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    pub locks: LockConfig,
    /// Registered by the coordinator on first use
    pub standard_locks: Vec<LockSpec>,
    /// Breakers created up front; others are created on demand with
    /// `default_circuit_breaker`
    pub circuit_breakers: BTreeMap<String, CircuitBreakerConfig>,
    pub default_circuit_breaker: CircuitBreakerConfig,
    pub retry: RetryPolicy,
    pub bulkheads: BTreeMap<String, BulkheadConfig>,
    pub rate_limits: BTreeMap<String, RateLimitConfig>,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            locks: LockConfig::default(),
            standard_locks: default_standard_locks(),
            circuit_breakers: BTreeMap::new(),
            default_circuit_breaker: CircuitBreakerConfig::default(),
            retry: RetryPolicy::default(),
            bulkheads: BTreeMap::new(),
            rate_limits: BTreeMap::new(),
        }
    }
}

impl ResilienceConfig {
    /// Validate every section, naming the offending entry in the error
    pub fn validate(&self) -> Result<()> {
        self.locks.validate()?;
        self.validate_standard_locks()?;
        self.default_circuit_breaker
            .validate()
            .map_err(|e| in_section("default_circuit_breaker", e))?;
        for (name, config) in &self.circuit_breakers {
            config
                .validate()
                .map_err(|e| in_section(&format!("circuit_breakers.{name}"), e))?;
        }
        self.retry.validate().map_err(|e| in_section("retry", e))?;
        for (name, config) in &self.bulkheads {
            config
                .validate()
                .map_err(|e| in_section(&format!("bulkheads.{name}"), e))?;
        }
        for (name, config) in &self.rate_limits {
            config
                .validate()
                .map_err(|e| in_section(&format!("rate_limits.{name}"), e))?;
        }
        Ok(())
    }

    fn validate_standard_locks(&self) -> Result<()> {
        let mut orders: HashMap<u32, &str> = HashMap::new();
        let mut names: HashMap<&str, u32> = HashMap::new();
        for spec in &self.standard_locks {
            if names.insert(&spec.name, spec.order).is_some() {
                return Err(Error::configuration(format!(
                    "standard lock '{}' is listed twice",
                    spec.name
                )));
            }
            if let Some(existing) = orders.insert(spec.order, &spec.name) {
                return Err(Error::configuration(format!(
                    "standard locks '{existing}' and '{}' share order {}",
                    spec.name, spec.order
                )));
            }
        }
        Ok(())
    }
}

fn in_section(section: &str, error: Error) -> Error {
    match error {
        Error::Configuration { message } => Error::configuration(format!("{section}: {message}")),
        other => other,
    }
}

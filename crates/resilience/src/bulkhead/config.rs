//! Admission limits for a bulkhead.

use rampart_core::serde_helpers::duration_ms;
use rampart_core::{
    Error, Result, DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_QUEUE_SIZE, DEFAULT_POOL_TIMEOUT,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkheadConfig {
    /// Operations allowed in flight at once
    pub max_concurrent: usize,
    /// Callers allowed to wait for a slot; beyond this, callers are turned
    /// away immediately
    pub max_queue_size: usize,
    /// How long a queued caller waits when no explicit timeout is given
    #[serde(with = "duration_ms")]
    pub timeout: Duration,
}

impl Default for BulkheadConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            timeout: DEFAULT_POOL_TIMEOUT,
        }
    }
}

impl BulkheadConfig {
    pub fn new(max_concurrent: usize, max_queue_size: usize, timeout: Duration) -> Self {
        Self {
            max_concurrent,
            max_queue_size,
            timeout,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(Error::configuration(
                "bulkhead max_concurrent must be at least 1",
            ));
        }
        Ok(())
    }
}

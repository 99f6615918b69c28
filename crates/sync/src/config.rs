//! Configuration for lock coordination.

use rampart_core::serde_helpers::duration_ms;
use rampart_core::{Error, Result, DEFAULT_DEADLOCK_THRESHOLD, DEFAULT_LOCK_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lock registry behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Budget for a blocking or async acquisition when the caller passes none
    #[serde(with = "duration_ms")]
    pub default_timeout: Duration,
    /// Hold duration past which `detect_potential_deadlocks` reports a lock
    #[serde(with = "duration_ms")]
    pub deadlock_threshold: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_LOCK_TIMEOUT,
            deadlock_threshold: DEFAULT_DEADLOCK_THRESHOLD,
        }
    }
}

impl LockConfig {
    pub fn validate(&self) -> Result<()> {
        if self.deadlock_threshold.is_zero() {
            return Err(Error::configuration(
                "lock deadlock_threshold must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// A lock the coordinator registers on first use
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockSpec {
    pub name: String,
    pub order: u32,
    #[serde(default)]
    pub description: String,
}

impl LockSpec {
    pub fn new(name: impl Into<String>, order: u32, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order,
            description: description.into(),
        }
    }
}

/// Locks shared by the usual consumers of this crate, lowest order first.
///
/// Orders are spaced by ten so callers can slot their own locks in between.
pub fn default_standard_locks() -> Vec<LockSpec> {
    vec![
        LockSpec::new("config", 10, "configuration snapshot and reloads"),
        LockSpec::new("logging", 20, "log sink setup and rotation"),
        LockSpec::new("http_client", 30, "shared HTTP connection state"),
        LockSpec::new("job_launcher", 40, "job spawning and bookkeeping"),
        LockSpec::new("metrics", 50, "counters shared across subsystems"),
    ]
}

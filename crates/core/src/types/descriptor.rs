//! Diagnostic snapshot of a registered lock

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Point-in-time view of one registered lock.
///
/// `owner`, `acquired_at` and `held_for` are only populated while the lock is
/// held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockDescriptor {
    pub name: String,
    pub order: u32,
    pub description: String,
    pub owner: Option<String>,
    pub acquired_at: Option<DateTime<Utc>>,
    pub held_for: Option<Duration>,
}

impl LockDescriptor {
    /// Whether the lock was held when the snapshot was taken
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.owner.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_serializes_for_diagnostics() {
        let descriptor = LockDescriptor {
            name: "config".to_string(),
            order: 10,
            description: "configuration reload".to_string(),
            owner: None,
            acquired_at: None,
            held_for: None,
        };
        assert!(!descriptor.is_held());
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["name"], "config");
        assert_eq!(json["order"], 10);
        assert!(json["owner"].is_null());
    }
}

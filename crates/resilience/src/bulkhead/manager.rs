//! Registry of named bulkheads.

use super::{Bulkhead, BulkheadConfig, PoolStatus};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rampart_core::{Error, Result, BULKHEAD_REGISTRY};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct BulkheadManager {
    bulkheads: DashMap<String, Arc<Bulkhead>>,
}

impl BulkheadManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a bulkhead. A name can only be registered once.
    pub fn create_bulkhead(
        &self,
        name: impl Into<String>,
        config: BulkheadConfig,
    ) -> Result<Arc<Bulkhead>> {
        let name = name.into();
        match self.bulkheads.entry(name.clone()) {
            Entry::Occupied(_) => Err(Error::duplicate_name(BULKHEAD_REGISTRY, name)),
            Entry::Vacant(slot) => {
                let bulkhead = Arc::new(Bulkhead::new(name.clone(), config)?);
                slot.insert(Arc::clone(&bulkhead));
                tracing::debug!(bulkhead = %name, "bulkhead created");
                Ok(bulkhead)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Bulkhead>> {
        self.bulkheads.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Unregister a bulkhead. Callers already holding it keep a working
    /// handle.
    pub fn remove(&self, name: &str) -> Option<Arc<Bulkhead>> {
        self.bulkheads.remove(name).map(|(_, bulkhead)| bulkhead)
    }

    pub fn len(&self) -> usize {
        self.bulkheads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bulkheads.is_empty()
    }

    /// Status of every registered bulkhead, sorted by name
    pub fn status_all(&self) -> Vec<PoolStatus> {
        let mut statuses: Vec<PoolStatus> = self
            .bulkheads
            .iter()
            .map(|entry| entry.value().get_status())
            .collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }
}

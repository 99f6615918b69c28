//! Per-caller record of lock orders currently held.

use dashmap::DashMap;
use rampart_core::CallerId;

#[derive(Debug, Default)]
pub(crate) struct HeldOrders {
    by_caller: DashMap<CallerId, Vec<u32>>,
}

impl HeldOrders {
    /// Highest order the caller holds, if any
    pub(crate) fn highest(&self, caller: CallerId) -> Option<u32> {
        self.by_caller
            .get(&caller)
            .and_then(|orders| orders.iter().copied().max())
    }

    pub(crate) fn orders(&self, caller: CallerId) -> Vec<u32> {
        self.by_caller
            .get(&caller)
            .map(|orders| orders.clone())
            .unwrap_or_default()
    }

    pub(crate) fn push(&self, caller: CallerId, orders: impl IntoIterator<Item = u32>) {
        self.by_caller.entry(caller).or_default().extend(orders);
    }

    /// Forget one held order. Guards may be dropped in any order, so this
    /// removes by value rather than popping.
    pub(crate) fn remove(&self, caller: CallerId, order: u32) {
        if let Some(mut orders) = self.by_caller.get_mut(&caller) {
            if let Some(index) = orders.iter().rposition(|held| *held == order) {
                orders.remove(index);
            }
        }
        self.by_caller.remove_if(&caller, |_, orders| orders.is_empty());
    }
}

//! Router - conditional fan-out to destinations
//!
//! Given a batch and the configured destinations, the router decides which
//! destinations receive which subset of records and invokes a delivery
//! callback per matched destination. Destinations are evaluated
//! independently: the same record may go to zero, one, or many destinations.

use contracts::{DataFlowComponent, EventRecord, RouteStrategy};

/// Record fan-out decision component
///
/// Injected at pipeline construction so tests can substitute trivial fakes;
/// there is no process-wide router instance.
pub trait Router: Send + Sync {
    /// Determine per-destination record subsets and deliver them
    ///
    /// For each destination whose matched subset is non-empty, `deliver` is
    /// invoked exactly once with that subset in original batch order.
    /// Destinations matched to zero records receive no call.
    fn route(
        &self,
        records: &[EventRecord],
        destinations: &[DataFlowComponent],
        strategy: &dyn RouteStrategy,
        deliver: &mut dyn FnMut(&DataFlowComponent, Vec<EventRecord>),
    );
}

/// Production router applying the route strategy per record per destination
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionRouter;

impl ConditionRouter {
    /// Create a condition router
    pub fn new() -> Self {
        Self
    }
}

impl Router for ConditionRouter {
    fn route(
        &self,
        records: &[EventRecord],
        destinations: &[DataFlowComponent],
        strategy: &dyn RouteStrategy,
        deliver: &mut dyn FnMut(&DataFlowComponent, Vec<EventRecord>),
    ) {
        for destination in destinations {
            let matched: Vec<EventRecord> = records
                .iter()
                .filter(|record| strategy.matches(record, destination))
                .cloned()
                .collect();

            if matched.is_empty() {
                continue;
            }
            deliver(destination, matched);
        }
    }
}

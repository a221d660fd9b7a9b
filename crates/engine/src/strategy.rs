//! Route selection strategies
//!
//! The production strategy evaluates named route conditions attached at
//! configuration time; a destination with no route restriction matches every
//! record.

use std::collections::HashMap;

use contracts::{DataFlowComponent, EventRecord, RouteCondition, RouteStrategy};

/// Named-route membership strategy
///
/// A record matches a destination when the destination is unrestricted, or
/// when any of its subscribed routes has a condition the record's event
/// satisfies. A subscribed route with no declared condition never matches;
/// the factory layer rejects such references up front.
#[derive(Debug, Clone, Default)]
pub struct ConditionStrategy {
    routes: HashMap<String, RouteCondition>,
}

impl ConditionStrategy {
    /// Create a strategy over the declared named routes
    pub fn new(routes: HashMap<String, RouteCondition>) -> Self {
        Self { routes }
    }
}

impl RouteStrategy for ConditionStrategy {
    fn matches(&self, record: &EventRecord, destination: &DataFlowComponent) -> bool {
        if destination.is_unrestricted() {
            return true;
        }

        destination.routes().iter().any(|name| {
            self.routes
                .get(name)
                .is_some_and(|condition| condition.evaluate(record.data()))
        })
    }
}

//! Routing predicates
//!
//! `RouteStrategy` decides record-to-destination matches; `RouteCondition` is
//! the configurable predicate a named route evaluates against an event.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DataFlowComponent, Event, EventRecord};

/// Record-to-destination match predicate
///
/// Encapsulated as a replaceable strategy so routing predicates are decoupled
/// from the fan-out mechanism. Supplied once per pipeline at construction.
pub trait RouteStrategy: Send + Sync {
    /// Whether `record` should be delivered to `destination`
    fn matches(&self, record: &EventRecord, destination: &DataFlowComponent) -> bool;
}

/// Configurable predicate backing a named route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteCondition {
    /// Matches when the field exists
    Exists { path: String },

    /// Matches when the field equals the given value
    Equals { path: String, value: Value },

    /// Matches when the field is absent or differs from the given value
    NotEquals { path: String, value: Value },
}

impl RouteCondition {
    /// Evaluate the condition against an event
    pub fn evaluate(&self, event: &Event) -> bool {
        match self {
            Self::Exists { path } => event.contains(path),
            Self::Equals { path, value } => event.get(path) == Some(value),
            Self::NotEquals { path, value } => event.get(path) != Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_event() -> Event {
        let mut event = Event::new();
        event.put("level", "error");
        event.put("status/code", 500);
        event
    }

    #[test]
    fn test_exists() {
        let event = sample_event();
        assert!(RouteCondition::Exists {
            path: "status/code".into()
        }
        .evaluate(&event));
        assert!(!RouteCondition::Exists {
            path: "missing".into()
        }
        .evaluate(&event));
    }

    #[test]
    fn test_equals() {
        let event = sample_event();
        let matching = RouteCondition::Equals {
            path: "level".into(),
            value: json!("error"),
        };
        let differing = RouteCondition::Equals {
            path: "level".into(),
            value: json!("info"),
        };
        assert!(matching.evaluate(&event));
        assert!(!differing.evaluate(&event));
    }

    #[test]
    fn test_not_equals_matches_missing_field() {
        let event = sample_event();
        let condition = RouteCondition::NotEquals {
            path: "missing".into(),
            value: json!("anything"),
        };
        assert!(condition.evaluate(&event));
    }

    #[test]
    fn test_condition_serde() {
        let condition = RouteCondition::Equals {
            path: "level".into(),
            value: json!("error"),
        };
        let text = serde_json::to_string(&condition).unwrap();
        let parsed: RouteCondition = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, condition);
    }
}

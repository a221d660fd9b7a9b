//! Record - the envelope moved between pipeline stages
//!
//! A record wraps a single unit of data and is structurally immutable: it
//! does not know its origin or destination, and only its payload may be
//! mutated by processors that operate in place.

use crate::Event;

/// Immutable envelope wrapping one unit of data
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    data: T,
}

impl<T> Record<T> {
    /// Wrap a payload in a record
    pub fn new(data: T) -> Self {
        Self { data }
    }

    /// Borrow the payload
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Mutably borrow the payload (for in-place transforms)
    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    /// Unwrap the payload
    pub fn into_data(self) -> T {
        self.data
    }
}

impl<T> From<T> for Record<T> {
    fn from(data: T) -> Self {
        Self::new(data)
    }
}

/// The record type the engine operates on
pub type EventRecord = Record<Event>;

/// An ordered collection of records read from the buffer in one operation
pub type Batch = Vec<EventRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_wraps_payload() {
        let record = Record::new("payload");
        assert_eq!(*record.data(), "payload");
        assert_eq!(record.into_data(), "payload");
    }

    #[test]
    fn test_record_payload_mutation() {
        let mut event = Event::new();
        event.put("n", 1);
        let mut record = Record::new(event);
        record.data_mut().put("n", 2);
        assert_eq!(record.data().get("n"), Some(&serde_json::json!(2)));
    }
}

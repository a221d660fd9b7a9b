//! Event - canonical structured payload
//!
//! An ordered mapping of field paths to JSON values. Fields are addressed by
//! `/`-separated paths; a leading `/` is accepted and ignored. Nested objects
//! are created on demand by `put`.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::PipelineError;

/// Metadata attached to an event at ingestion time
#[derive(Debug, Clone, PartialEq)]
pub struct EventMetadata {
    /// Logical event type (e.g. "log", "metric")
    pub event_type: String,

    /// Timestamp the event entered the pipeline
    pub time_received: DateTime<Utc>,

    /// Free-form attributes set by sources or processors
    pub attributes: HashMap<String, String>,
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self {
            event_type: "event".to_string(),
            time_received: Utc::now(),
            attributes: HashMap::new(),
        }
    }
}

impl EventMetadata {
    /// Create metadata with the given event type, received now
    pub fn with_event_type(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            ..Default::default()
        }
    }
}

/// Structured event payload
///
/// The field map preserves insertion order. While a `Record<Event>` is in
/// flight the event is owned exclusively by that record; processors that
/// transform in place receive mutable access through the record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Event {
    fields: Map<String, Value>,
    metadata: EventMetadata,
}

impl Event {
    /// Create an empty event with default metadata
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an event from a JSON object value
    ///
    /// # Errors
    /// Returns `InvalidEvent` when the value is not a JSON object.
    pub fn from_json(value: Value) -> Result<Self, PipelineError> {
        match value {
            Value::Object(fields) => Ok(Self {
                fields,
                metadata: EventMetadata::default(),
            }),
            other => Err(PipelineError::invalid_event(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    /// Get a field value by path
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = split_path(path);
        let first = segments.next()?;
        let mut current = self.fields.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Check whether a field exists at the given path
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Set a field value by path
    ///
    /// Intermediate segments are created as objects; a non-object value in
    /// the middle of the path is replaced by an object.
    pub fn put(&mut self, path: &str, value: impl Into<Value>) {
        let segments: Vec<&str> = split_path(path).collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut current = &mut self.fields;
        for segment in parents {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(map) = entry else {
                return;
            };
            current = map;
        }
        current.insert(last.to_string(), value.into());
    }

    /// Remove a field by path, returning the removed value
    pub fn delete(&mut self, path: &str) -> Option<Value> {
        let segments: Vec<&str> = split_path(path).collect();
        let (last, parents) = segments.split_last()?;

        let mut current = &mut self.fields;
        for segment in parents {
            current = current.get_mut(*segment)?.as_object_mut()?;
        }
        current.remove(*last)
    }

    /// Get event metadata
    pub fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    /// Get mutable event metadata
    pub fn metadata_mut(&mut self) -> &mut EventMetadata {
        &mut self.metadata
    }

    /// Number of top-level fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the event has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// View the fields as a JSON value
    pub fn to_json_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Serialize the fields as a JSON line (no trailing newline)
    ///
    /// # Errors
    /// Returns `InvalidEvent` if serialization fails.
    pub fn to_json_bytes(&self) -> Result<Bytes, PipelineError> {
        serde_json::to_vec(&self.fields)
            .map(Bytes::from)
            .map_err(|e| PipelineError::invalid_event(format!("serialize error: {e}")))
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

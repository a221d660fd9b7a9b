//! AddFieldsProcessor - inject static fields into events

use serde::Deserialize;
use serde_json::{Map, Value};

use contracts::{Batch, PipelineError, Processor};

use crate::config;

/// Add-fields processor configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddFieldsConfig {
    /// Field path -> value added to every event
    pub fields: Map<String, Value>,

    /// Replace fields that already exist
    pub overwrite: bool,
}

/// Processor injecting static fields into every event
pub struct AddFieldsProcessor {
    config: AddFieldsConfig,
}

impl AddFieldsProcessor {
    /// Create an add-fields processor with the given configuration
    pub fn new(config: AddFieldsConfig) -> Self {
        Self { config }
    }

    /// Create an add-fields processor from an opaque plugin config value
    ///
    /// # Errors
    /// Returns a config parse error for a malformed value.
    pub fn from_config(value: &Value) -> Result<Self, PipelineError> {
        Ok(Self::new(config::bind("add_fields", value)?))
    }
}

impl Processor for AddFieldsProcessor {
    fn name(&self) -> &str {
        "add_fields"
    }

    fn execute(&mut self, mut records: Batch) -> Result<Batch, PipelineError> {
        for record in &mut records {
            let event = record.data_mut();
            for (path, value) in &self.config.fields {
                if !self.config.overwrite && event.contains(path) {
                    continue;
                }
                event.put(path, value.clone());
            }
        }
        Ok(records)
    }
}

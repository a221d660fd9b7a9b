//! RenameFieldsProcessor - move event fields to new paths

use serde::Deserialize;
use serde_json::Value;

use contracts::{Batch, PipelineError, Processor};

use crate::config;

/// One rename operation
#[derive(Debug, Clone, Deserialize)]
pub struct RenameEntry {
    /// Source field path
    pub from: String,

    /// Target field path
    pub to: String,

    /// Replace the target when it already exists
    #[serde(default)]
    pub overwrite: bool,
}

/// Rename processor configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RenameFieldsConfig {
    /// Renames applied in order to every event
    pub entries: Vec<RenameEntry>,
}

/// Processor moving fields to new paths
///
/// An entry is skipped when the source equals the target or the source field
/// is absent; an existing target is only replaced when `overwrite` is set.
pub struct RenameFieldsProcessor {
    entries: Vec<RenameEntry>,
}

impl RenameFieldsProcessor {
    /// Create a rename processor with the given configuration
    pub fn new(config: RenameFieldsConfig) -> Self {
        Self {
            entries: config.entries,
        }
    }

    /// Create a rename processor from an opaque plugin config value
    ///
    /// # Errors
    /// Returns a config parse error for a malformed value.
    pub fn from_config(value: &Value) -> Result<Self, PipelineError> {
        Ok(Self::new(config::bind("rename_fields", value)?))
    }
}

impl Processor for RenameFieldsProcessor {
    fn name(&self) -> &str {
        "rename_fields"
    }

    fn execute(&mut self, mut records: Batch) -> Result<Batch, PipelineError> {
        for record in &mut records {
            let event = record.data_mut();
            for entry in &self.entries {
                if entry.from == entry.to || !event.contains(&entry.from) {
                    continue;
                }
                if !event.contains(&entry.to) || entry.overwrite {
                    if let Some(value) = event.delete(&entry.from) {
                        event.put(&entry.to, value);
                    }
                }
            }
        }
        Ok(records)
    }
}

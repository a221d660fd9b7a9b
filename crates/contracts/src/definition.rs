//! PipelineDefinition - Config Loader output
//!
//! Describes a complete pipeline: source, buffer, processor stages, named
//! routes, sinks, worker count, and shutdown timeouts.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::RouteCondition;

/// Complete pipeline definition
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PipelineDefinition {
    /// Pipeline name (used for diagnostics)
    #[validate(length(min = 1, message = "pipeline name must not be empty"))]
    pub name: String,

    /// Number of processor worker tasks
    #[serde(default = "default_workers")]
    #[validate(range(min = 1, message = "workers must be a positive integer"))]
    pub workers: usize,

    /// Shutdown and batching timeouts
    #[serde(default)]
    pub timeouts: TimeoutSettings,

    /// Buffer settings
    #[serde(default)]
    pub buffer: BufferSettings,

    /// Source declaration
    pub source: PluginDeclaration,

    /// Ordered processor stages
    #[serde(default)]
    pub stages: Vec<StageDefinition>,

    /// Named routes (route name -> condition)
    #[serde(default)]
    pub routes: HashMap<String, RouteCondition>,

    /// Sink declarations
    #[validate(length(min = 1, message = "at least one sink is required"))]
    pub sinks: Vec<SinkDeclaration>,
}

/// A plugin reference: registry name plus its opaque configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDeclaration {
    /// Registered plugin name
    pub plugin: String,

    /// Plugin-specific configuration, passed through untouched
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub config: Value,
}

/// One logical transformation step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDefinition {
    /// Processors executed in series within this stage
    pub processors: Vec<PluginDeclaration>,
}

/// A sink plugin plus its routing subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkDeclaration {
    /// Registered plugin name
    pub plugin: String,

    /// Instance name override (defaults to the plugin name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Subscribed route names (empty = receive every record)
    #[serde(default)]
    pub routes: Vec<String>,

    /// Plugin-specific configuration, passed through untouched
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub config: Value,
}

impl SinkDeclaration {
    /// Effective instance name
    pub fn instance_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.plugin)
    }
}

/// Batching and shutdown timeouts, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutSettings {
    /// Bounded wait for one buffer read
    #[serde(default = "default_read_batch_ms")]
    pub read_batch_ms: u64,

    /// Bounded wait for processor workers to exit on shutdown
    #[serde(default = "default_processor_shutdown_ms")]
    pub processor_shutdown_ms: u64,

    /// Bounded wait for sink shutdown
    #[serde(default = "default_sink_shutdown_ms")]
    pub sink_shutdown_ms: u64,

    /// Grace period for in-flight hand-off abandoned by the worker deadline
    #[serde(default)]
    pub drain_ms: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            read_batch_ms: default_read_batch_ms(),
            processor_shutdown_ms: default_processor_shutdown_ms(),
            sink_shutdown_ms: default_sink_shutdown_ms(),
            drain_ms: 0,
        }
    }
}

impl TimeoutSettings {
    /// Read-batch timeout as a duration
    pub fn read_batch(&self) -> Duration {
        Duration::from_millis(self.read_batch_ms)
    }

    /// Processor-shutdown timeout as a duration
    pub fn processor_shutdown(&self) -> Duration {
        Duration::from_millis(self.processor_shutdown_ms)
    }

    /// Sink-shutdown timeout as a duration
    pub fn sink_shutdown(&self) -> Duration {
        Duration::from_millis(self.sink_shutdown_ms)
    }

    /// Drain timeout as a duration
    pub fn drain(&self) -> Duration {
        Duration::from_millis(self.drain_ms)
    }
}

/// Buffer plugin selection and capacity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferSettings {
    /// Registered buffer plugin name
    #[serde(default = "default_buffer_plugin")]
    pub plugin: String,

    /// Maximum records held
    #[serde(default = "default_buffer_capacity")]
    pub capacity: usize,

    /// Maximum records returned by one read
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            plugin: default_buffer_plugin(),
            capacity: default_buffer_capacity(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_workers() -> usize {
    1
}

fn default_read_batch_ms() -> u64 {
    500
}

fn default_processor_shutdown_ms() -> u64 {
    10_000
}

fn default_sink_shutdown_ms() -> u64 {
    10_000
}

fn default_buffer_plugin() -> String {
    "blocking".to_string()
}

fn default_buffer_capacity() -> usize {
    512
}

fn default_batch_size() -> usize {
    128
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_definition_defaults() {
        let definition: PipelineDefinition = serde_json::from_value(json!({
            "name": "demo",
            "source": { "plugin": "generator" },
            "sinks": [{ "plugin": "log" }]
        }))
        .unwrap();

        assert_eq!(definition.workers, 1);
        assert_eq!(definition.buffer.plugin, "blocking");
        assert_eq!(definition.buffer.capacity, 512);
        assert_eq!(definition.timeouts.read_batch_ms, 500);
        assert!(definition.stages.is_empty());
        assert!(definition.routes.is_empty());
        assert_eq!(definition.sinks[0].instance_name(), "log");
        assert!(definition.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let definition: PipelineDefinition = serde_json::from_value(json!({
            "name": "demo",
            "workers": 0,
            "source": { "plugin": "generator" },
            "sinks": [{ "plugin": "log" }]
        }))
        .unwrap();

        assert!(definition.validate().is_err());
    }

    #[test]
    fn test_routes_parse() {
        let definition: PipelineDefinition = serde_json::from_value(json!({
            "name": "demo",
            "source": { "plugin": "generator" },
            "routes": {
                "errors": { "type": "equals", "path": "level", "value": "error" }
            },
            "sinks": [{ "plugin": "log", "routes": ["errors"] }]
        }))
        .unwrap();

        assert_eq!(definition.routes.len(), 1);
        assert_eq!(definition.sinks[0].routes, vec!["errors"]);
    }
}

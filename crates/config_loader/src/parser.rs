//! Configuration parsing
//!
//! TOML (primary) and JSON (secondary) formats.

use contracts::{PipelineDefinition, PipelineError};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer the format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse a TOML pipeline definition
pub fn parse_toml(content: &str) -> Result<PipelineDefinition, PipelineError> {
    toml::from_str(content).map_err(|e| PipelineError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse a JSON pipeline definition
pub fn parse_json(content: &str) -> Result<PipelineDefinition, PipelineError> {
    serde_json::from_str(content).map_err(|e| PipelineError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse a pipeline definition in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<PipelineDefinition, PipelineError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
name = "demo"

[source]
plugin = "generator"

[[sinks]]
plugin = "log"
"#;
        let definition = parse_toml(content).unwrap();
        assert_eq!(definition.name, "demo");
        assert_eq!(definition.workers, 1);
        assert_eq!(definition.source.plugin, "generator");
        assert_eq!(definition.sinks.len(), 1);
    }

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
name = "staged"
workers = 2

[timeouts]
read_batch_ms = 250
processor_shutdown_ms = 2000

[buffer]
capacity = 64
batch_size = 16

[source]
plugin = "file"
[source.config]
path = "input.ndjson"

[[stages]]
[[stages.processors]]
plugin = "rename_fields"
[stages.processors.config]
entries = [{ from = "msg", to = "message" }]

[routes.errors]
type = "equals"
path = "level"
value = "error"

[[sinks]]
plugin = "file"
name = "error_file"
routes = ["errors"]
[sinks.config]
path = "errors.ndjson"

[[sinks]]
plugin = "log"
"#;
        let definition = parse_toml(content).unwrap();
        assert_eq!(definition.workers, 2);
        assert_eq!(definition.timeouts.read_batch_ms, 250);
        assert_eq!(definition.buffer.capacity, 64);
        assert_eq!(definition.stages.len(), 1);
        assert_eq!(definition.stages[0].processors[0].plugin, "rename_fields");
        assert!(definition.routes.contains_key("errors"));
        assert_eq!(definition.sinks[0].instance_name(), "error_file");
        assert_eq!(definition.sinks[1].instance_name(), "log");
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "name": "demo",
            "source": { "plugin": "generator" },
            "sinks": [{ "plugin": "log" }]
        }"#;
        let definition = parse_json(content).unwrap();
        assert_eq!(definition.name, "demo");
    }

    #[test]
    fn test_parse_toml_rejects_garbage() {
        assert!(parse_toml("not a definition").is_err());
    }
}

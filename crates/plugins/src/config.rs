//! Plugin configuration binding helpers

use serde::de::DeserializeOwned;
use serde_json::Value;

use contracts::PipelineError;

/// Bind an opaque plugin config value to a typed configuration
///
/// A null/absent value binds to the type's defaults.
pub(crate) fn bind<T: DeserializeOwned + Default>(
    plugin: &str,
    value: &Value,
) -> Result<T, PipelineError> {
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value.clone())
        .map_err(|e| PipelineError::config_parse(format!("plugin '{plugin}' config: {e}")))
}

/// Bind a config value that has no defaults (required fields)
pub(crate) fn bind_required<T: DeserializeOwned>(
    plugin: &str,
    value: &Value,
) -> Result<T, PipelineError> {
    serde_json::from_value(value.clone())
        .map_err(|e| PipelineError::config_parse(format!("plugin '{plugin}' config: {e}")))
}

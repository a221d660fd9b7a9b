//! Configuration validation
//!
//! Validation rules:
//! - derive-level rules (non-empty name, positive worker count, >=1 sink)
//! - sink instance names unique
//! - every stage has at least one processor
//! - buffer capacity/batch size sane
//! - sink route references declared

use std::collections::HashSet;

use validator::Validate;

use contracts::{PipelineDefinition, PipelineError};

/// Validate a pipeline definition
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(definition: &PipelineDefinition) -> Result<(), PipelineError> {
    validate_derived_rules(definition)?;
    validate_sink_names(definition)?;
    validate_stages(definition)?;
    validate_buffer(definition)?;
    validate_route_references(definition)?;
    Ok(())
}

fn validate_derived_rules(definition: &PipelineDefinition) -> Result<(), PipelineError> {
    definition.validate().map_err(|errors| {
        let (field, message) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errors)| {
                let message = errors
                    .first()
                    .and_then(|e| e.message.as_deref())
                    .unwrap_or("invalid value")
                    .to_string();
                (field.to_string(), message)
            })
            .unwrap_or_else(|| ("definition".to_string(), "invalid".to_string()));
        PipelineError::config_validation(field, message)
    })
}

fn validate_sink_names(definition: &PipelineDefinition) -> Result<(), PipelineError> {
    let mut seen = HashSet::new();
    for sink in &definition.sinks {
        if !seen.insert(sink.instance_name()) {
            return Err(PipelineError::config_validation(
                format!("sinks[name={}]", sink.instance_name()),
                "duplicate sink name",
            ));
        }
    }
    Ok(())
}

fn validate_stages(definition: &PipelineDefinition) -> Result<(), PipelineError> {
    for (index, stage) in definition.stages.iter().enumerate() {
        if stage.processors.is_empty() {
            return Err(PipelineError::config_validation(
                format!("stages[{index}]"),
                "stage has no processors",
            ));
        }
    }
    Ok(())
}

fn validate_buffer(definition: &PipelineDefinition) -> Result<(), PipelineError> {
    let buffer = &definition.buffer;
    if buffer.capacity == 0 {
        return Err(PipelineError::config_validation(
            "buffer.capacity",
            "capacity must be > 0",
        ));
    }
    if buffer.batch_size == 0 {
        return Err(PipelineError::config_validation(
            "buffer.batch_size",
            "batch_size must be > 0",
        ));
    }
    if buffer.batch_size > buffer.capacity {
        return Err(PipelineError::config_validation(
            "buffer.batch_size",
            format!(
                "batch_size {} exceeds capacity {}",
                buffer.batch_size, buffer.capacity
            ),
        ));
    }
    Ok(())
}

fn validate_route_references(definition: &PipelineDefinition) -> Result<(), PipelineError> {
    for sink in &definition.sinks {
        for route in &sink.routes {
            if !definition.routes.contains_key(route) {
                return Err(PipelineError::config_validation(
                    format!("sinks[name={}].routes", sink.instance_name()),
                    format!("undeclared route '{route}'"),
                ));
            }
        }
    }
    Ok(())
}

//! Pipeline assembly from a definition
//!
//! Instantiates every declared plugin through the registry and wires the
//! engine's builder. Processor factories run once per worker so each worker
//! gets an identical, independently owned stage sequence.

use tracing::{info, instrument};

use contracts::{DataFlowComponent, PipelineDefinition, Stage, WorkerStageSequence};
use engine::{ConditionStrategy, Pipeline};

use crate::error::FactoryError;
use crate::registry::PluginRegistry;

/// Build a pipeline from its definition
///
/// # Errors
/// Unknown plugin names, undeclared route references, plugin construction
/// failures, and engine builder errors.
#[instrument(name = "factory_build_pipeline", skip(definition, registry), fields(pipeline = %definition.name))]
pub fn build_pipeline(
    definition: &PipelineDefinition,
    registry: &PluginRegistry,
) -> Result<Pipeline, FactoryError> {
    for sink in &definition.sinks {
        for route in &sink.routes {
            if !definition.routes.contains_key(route) {
                return Err(FactoryError::UnknownRoute {
                    sink: sink.instance_name().to_string(),
                    route: route.clone(),
                });
            }
        }
    }

    let buffer = registry.create_buffer(&definition.buffer)?;
    let source = registry.create_source(&definition.source.plugin, &definition.source.config)?;

    let mut worker_sets = Vec::with_capacity(definition.workers);
    for _ in 0..definition.workers {
        let mut stages = Vec::with_capacity(definition.stages.len());
        for stage in &definition.stages {
            let mut processors = Vec::with_capacity(stage.processors.len());
            for declaration in &stage.processors {
                processors
                    .push(registry.create_processor(&declaration.plugin, &declaration.config)?);
            }
            stages.push(Stage::new(processors));
        }
        worker_sets.push(WorkerStageSequence::new(stages));
    }

    let mut destinations = Vec::with_capacity(definition.sinks.len());
    for sink in &definition.sinks {
        let instance =
            registry.create_sink(&sink.plugin, sink.instance_name(), &sink.config)?;
        destinations.push(DataFlowComponent::new(instance, sink.routes.clone()));
    }

    let pipeline = Pipeline::builder(definition.name.as_str())
        .source(source)
        .buffer(buffer)
        .workers(definition.workers)
        .worker_sets(worker_sets)
        .destinations(destinations)
        .route_strategy(Box::new(ConditionStrategy::new(definition.routes.clone())))
        .read_batch_timeout(definition.timeouts.read_batch())
        .processor_shutdown_timeout(definition.timeouts.processor_shutdown())
        .sink_shutdown_timeout(definition.timeouts.sink_shutdown())
        .drain_timeout(definition.timeouts.drain())
        .build()?;

    info!(
        pipeline = %definition.name,
        workers = definition.workers,
        stages = definition.stages.len(),
        sinks = definition.sinks.len(),
        routes = definition.routes.len(),
        "pipeline assembled"
    );
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn definition(value: serde_json::Value) -> PipelineDefinition {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_builds_minimal_pipeline() {
        let definition = definition(json!({
            "name": "demo",
            "source": { "plugin": "generator" },
            "sinks": [{ "plugin": "log" }]
        }));

        let pipeline = build_pipeline(&definition, &PluginRegistry::with_defaults()).unwrap();
        assert_eq!(pipeline.name(), "demo");
        assert_eq!(pipeline.worker_count(), 1);
        assert!(pipeline.processor_sets().is_empty());
        assert_eq!(pipeline.sinks().len(), 1);
    }

    #[tokio::test]
    async fn test_builds_staged_multi_worker_pipeline() {
        let definition = definition(json!({
            "name": "staged",
            "workers": 3,
            "source": { "plugin": "generator" },
            "stages": [
                { "processors": [{ "plugin": "add_fields", "config": { "fields": { "k": "v" } } }] },
                { "processors": [{ "plugin": "rename_fields" }] }
            ],
            "sinks": [{ "plugin": "log" }]
        }));

        let pipeline = build_pipeline(&definition, &PluginRegistry::with_defaults()).unwrap();
        assert_eq!(pipeline.worker_count(), 3);
        assert_eq!(pipeline.processor_sets().len(), 2);
        assert_eq!(pipeline.processor_sets()[0], vec!["add_fields".to_string()]);
    }

    #[tokio::test]
    async fn test_undeclared_route_reference_is_rejected() {
        let definition = definition(json!({
            "name": "demo",
            "source": { "plugin": "generator" },
            "sinks": [{ "plugin": "log", "routes": ["missing"] }]
        }));

        let error =
            build_pipeline(&definition, &PluginRegistry::with_defaults()).unwrap_err();
        assert!(matches!(error, FactoryError::UnknownRoute { .. }));
        assert!(error.to_string().contains("missing"));
    }

    #[tokio::test]
    async fn test_unknown_sink_plugin_is_rejected() {
        let definition = definition(json!({
            "name": "demo",
            "source": { "plugin": "generator" },
            "sinks": [{ "plugin": "nonexistent" }]
        }));

        let error =
            build_pipeline(&definition, &PluginRegistry::with_defaults()).unwrap_err();
        assert!(matches!(error, FactoryError::UnknownPlugin { .. }));
    }
}

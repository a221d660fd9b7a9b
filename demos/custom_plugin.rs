//! Custom Plugin Demo
//!
//! Registers a processor defined in this file alongside the built-ins and
//! runs it in a pipeline, showing how embedders extend the registry at
//! process startup.
//!
//! Run with: cargo run --bin custom_plugin

use std::time::Duration;

use contracts::{Batch, PipelineError, Processor};
use config_loader::{ConfigFormat, ConfigLoader};
use pipeline_factory::PluginRegistry;

/// Uppercases the string at a fixed field path
struct UppercaseProcessor {
    path: String,
}

impl Processor for UppercaseProcessor {
    fn name(&self) -> &str {
        "uppercase"
    }

    fn execute(&mut self, mut records: Batch) -> Result<Batch, PipelineError> {
        for record in &mut records {
            let event = record.data_mut();
            if let Some(value) = event.get(&self.path).and_then(|v| v.as_str()) {
                let upper = value.to_uppercase();
                event.put(&self.path, upper);
            }
        }
        Ok(records)
    }
}

const DEFINITION: &str = r#"
name = "custom"

[timeouts]
read_batch_ms = 100

[source]
plugin = "generator"
[source.config]
interval_ms = 100
count = 20
[source.config.fields]
greeting = "hello"

[[stages]]
[[stages.processors]]
plugin = "uppercase"
[stages.processors.config]
path = "greeting"

[[sinks]]
plugin = "log"
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut registry = PluginRegistry::with_defaults();
    registry.register_processor("uppercase", |config| {
        let path = config
            .get("path")
            .and_then(|v| v.as_str())
            .unwrap_or("message")
            .to_string();
        Ok(Box::new(UppercaseProcessor { path }))
    });

    let definition = ConfigLoader::load_from_str(DEFINITION, ConfigFormat::Toml)?;
    let pipeline = pipeline_factory::build_pipeline(&definition, &registry)?;

    pipeline.execute().await?;
    tokio::time::sleep(Duration::from_secs(3)).await;
    pipeline.shutdown().await;

    tracing::info!(
        records = pipeline.metrics().snapshot().records_processed,
        "Custom plugin demo finished"
    );
    Ok(())
}

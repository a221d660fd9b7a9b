//! Complete Pipeline Demo
//!
//! Builds a pipeline from an inline definition (or a file passed as the
//! first argument) and runs it for a few seconds.
//!
//! Run with: cargo run --bin complete_pipeline

use std::time::Duration;

use config_loader::{ConfigFormat, ConfigLoader};
use pipeline_factory::PluginRegistry;

const DEMO_DEFINITION: &str = r#"
name = "demo"
workers = 2

[timeouts]
read_batch_ms = 100

[source]
plugin = "generator"
[source.config]
interval_ms = 50
[source.config.fields]
service = "demo"

[[stages]]
[[stages.processors]]
plugin = "add_fields"
[stages.processors.config]
fields = { stage = "enriched" }

[routes.even]
type = "exists"
path = "service"

[[sinks]]
plugin = "log"
routes = ["even"]
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting complete pipeline demo");

    // ==== Stage 1: Use inline definition or load from file ====
    let definition = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading pipeline definition");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        ConfigLoader::load_from_str(DEMO_DEFINITION, ConfigFormat::Toml)?
    };

    // ==== Stage 2: Assemble ====
    let registry = PluginRegistry::with_defaults();
    let pipeline = pipeline_factory::build_pipeline(&definition, &registry)?;

    tracing::info!(
        pipeline = pipeline.name(),
        workers = pipeline.worker_count(),
        sinks = pipeline.sinks().len(),
        "Pipeline assembled"
    );

    // ==== Stage 3: Run ====
    pipeline.execute().await?;
    tokio::time::sleep(Duration::from_secs(3)).await;

    // ==== Stage 4: Shutdown ====
    pipeline.shutdown().await;

    let snapshot = pipeline.metrics().snapshot();
    tracing::info!(
        records_processed = snapshot.records_processed,
        records_delivered = snapshot.records_delivered,
        "Demo finished"
    );

    Ok(())
}

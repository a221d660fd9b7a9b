//! `run` command implementation.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};

use pipeline_factory::PluginRegistry;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::stats::RunSummary;

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading pipeline definition");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut definition = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load definition from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(workers) = args.workers {
        info!(workers, "Overriding worker count from CLI");
        definition.workers = workers;
    }

    info!(
        pipeline = %definition.name,
        workers = definition.workers,
        stages = definition.stages.len(),
        sinks = definition.sinks.len(),
        "Definition loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - definition is valid, exiting");
        return Ok(());
    }

    // Metrics exporter (optional; tracing is already initialized)
    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let registry = PluginRegistry::with_defaults();
    let pipeline = pipeline_factory::build_pipeline(&definition, &registry)
        .context("Failed to assemble pipeline")?;

    let start_time = Instant::now();

    info!("Starting pipeline...");
    pipeline
        .execute()
        .await
        .map_err(|e| CliError::pipeline_execution(e.to_string()))?;

    // Run until the duration elapses, ctrl-c arrives, or the pipeline stops
    // itself after an internal failure.
    let deadline = (args.duration > 0).then(|| Duration::from_secs(args.duration));
    tokio::select! {
        _ = setup_shutdown_signal() => {
            warn!("Received shutdown signal, stopping pipeline...");
        }
        _ = run_window(deadline) => {
            info!(duration_secs = args.duration, "Run duration elapsed, stopping pipeline...");
        }
        _ = wait_for_stop(&pipeline) => {
            warn!("Pipeline stopped itself, collecting final state...");
        }
    }

    pipeline.shutdown().await;

    let summary = RunSummary {
        pipeline: pipeline.name().to_string(),
        duration: start_time.elapsed(),
        workers: pipeline.worker_count(),
        sinks: pipeline.sinks().len(),
        metrics: pipeline.metrics().snapshot(),
    };
    summary.print_summary();

    info!("Flowline finished");
    Ok(())
}

/// Sleep for the bounded run window, or forever when unbounded
async fn run_window(deadline: Option<Duration>) {
    match deadline {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

/// Resolve once the pipeline has a stop requested (fatal-failure path)
async fn wait_for_stop(pipeline: &engine::Pipeline) {
    while !pipeline.is_stop_requested() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

//! `info` command implementation.

use anyhow::{Context, Result};

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let definition = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load definition from {}", args.config.display()))?;

    if args.json {
        println!("{}", config_loader::ConfigLoader::to_json(&definition)?);
        return Ok(());
    }

    println!("Pipeline: {}", definition.name);
    println!("  workers  {}", definition.workers);
    println!(
        "  buffer   {} (capacity {}, batch size {})",
        definition.buffer.plugin, definition.buffer.capacity, definition.buffer.batch_size
    );
    println!("  source   {}", definition.source.plugin);

    println!("  stages   {}", definition.stages.len());
    for (index, stage) in definition.stages.iter().enumerate() {
        let processors: Vec<&str> = stage
            .processors
            .iter()
            .map(|p| p.plugin.as_str())
            .collect();
        println!("    [{index}] {}", processors.join(" -> "));
    }

    println!("  routes   {}", definition.routes.len());
    for name in definition.routes.keys() {
        println!("    {name}");
    }

    println!("  sinks    {}", definition.sinks.len());
    for sink in &definition.sinks {
        if sink.routes.is_empty() {
            println!("    {} (unrestricted)", sink.instance_name());
        } else {
            println!("    {} (routes: {})", sink.instance_name(), sink.routes.join(", "));
        }
    }

    Ok(())
}

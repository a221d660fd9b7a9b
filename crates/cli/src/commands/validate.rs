//! `validate` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ValidateArgs;
use crate::error::CliError;

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let definition = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Validation failed for {}", args.config.display()))?;

    if args.json {
        println!("{}", config_loader::ConfigLoader::to_json(&definition)?);
    } else {
        println!("OK: {} is a valid pipeline definition", args.config.display());
    }

    info!(pipeline = %definition.name, "Definition validated");
    Ok(())
}

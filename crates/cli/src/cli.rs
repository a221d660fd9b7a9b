//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Flowline - streaming data-pipeline execution engine
#[derive(Parser, Debug)]
#[command(
    name = "flowline",
    author,
    version,
    about = "Streaming data-pipeline execution engine",
    long_about = "Runs a data pipeline defined in configuration: a source writes \n\
                  records into a bounded buffer, processor workers transform them \n\
                  in stages, and a conditional router fans the results out to sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FLOWLINE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "FLOWLINE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a pipeline
    Run(RunArgs),

    /// Validate a pipeline definition without running it
    Validate(ValidateArgs),

    /// Display pipeline definition information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to the pipeline definition (TOML or JSON)
    #[arg(short, long, default_value = "pipeline.toml", env = "FLOWLINE_CONFIG")]
    pub config: PathBuf,

    /// Stop the pipeline after this many seconds (0 = run until ctrl-c)
    #[arg(long, default_value = "0", env = "FLOWLINE_DURATION")]
    pub duration: u64,

    /// Override the configured worker count
    #[arg(long, env = "FLOWLINE_WORKERS")]
    pub workers: Option<usize>,

    /// Validate the definition and exit without running the pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9600", env = "FLOWLINE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the pipeline definition to validate
    #[arg(short, long, default_value = "pipeline.toml")]
    pub config: PathBuf,

    /// Output the validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to the pipeline definition
    #[arg(short, long, default_value = "pipeline.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

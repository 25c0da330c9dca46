//! Argument parsing for the grafo CLI

use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;

/// Grafo: training-run orchestration for graph transformers
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "grafo")]
#[command(version)]
#[command(about = "Config-driven training-run orchestration: optimizers, schedules, checkpoints")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Validate a run configuration without training
    Validate(ValidateArgs),

    /// Display information about a run configuration
    Info(InfoArgs),

    /// Preview the learning-rate schedule a configuration produces
    Schedule(ScheduleArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Show detailed validation report
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments for the schedule command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ScheduleArgs {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Micro-batches per epoch, as the data loader will deliver them
    #[arg(short, long)]
    pub batches_per_epoch: usize,

    /// Print every Nth optimizer step instead of phase boundaries only
    #[arg(short, long)]
    pub every: Option<usize>,
}

/// Output format for the info command
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Parse CLI arguments from an iterator, for testing and for `main`.
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args)
}

//! CLI for inspecting training-run configurations
//!
//! # Usage
//!
//! ```bash
//! # Validate a run config
//! grafo validate configs/honma.toml
//!
//! # Show config info
//! grafo info configs/honma.toml --format json
//!
//! # Preview the one-cycle schedule for a run
//! grafo schedule configs/honma.toml --batches-per-epoch 250
//! ```

mod args;
mod commands;
mod logging;

pub use args::{parse_args, Cli, Command, InfoArgs, OutputFormat, ScheduleArgs, ValidateArgs};
pub use commands::run_command;
pub use logging::LogLevel;

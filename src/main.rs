//! Grafo CLI
//!
//! Configuration inspection entry point for the grafo library.
//!
//! # Usage
//!
//! ```bash
//! # Validate config
//! grafo validate configs/honma.toml
//!
//! # Show config info
//! grafo info configs/honma.toml
//!
//! # Preview the learning-rate schedule
//! grafo schedule configs/honma.toml --batches-per-epoch 250
//! ```

use clap::Parser;
use grafo::cli::{run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

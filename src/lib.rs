//! Grafo: config-driven training-run orchestration for graph transformers
//!
//! The crate turns a validated TOML run configuration into the runtime
//! objects of one training run: an optimizer, a one-cycle learning-rate
//! schedule, a gradient-accumulation controller, and a checkpoint policy,
//! all driven by a single-threaded [`train::TrainingOrchestrator`]. The
//! numerical backend and the data loader stay behind traits; this crate
//! owns the control flow, not the forward pass.
//!
//! # Example
//!
//! ```no_run
//! use grafo::config::RunConfig;
//! use grafo::train::{JsonCheckpointSink, TrainingOrchestrator};
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::load("configs/honma.toml")?;
//! let params = vec![grafo::param::Parameter::zeros(128)];
//! let orchestrator = TrainingOrchestrator::new(&config, params, 250)?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod optim;
pub mod param;
pub mod schedule;
pub mod train;

pub use config::{ConfigError, RunConfig};
pub use param::Parameter;

//! Invariant checks run at load time
//!
//! Every range constraint is enforced here, before any factory runs, so a
//! bad document never reaches the training loop.

use super::RunConfig;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors.
///
/// All of these are fatal: the caller gets either a fully validated
/// [`RunConfig`] or one of these, never a partial object.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {value} (expected {constraint})")]
    InvalidRange {
        field: &'static str,
        value: String,
        constraint: &'static str,
    },

    #[error("model.heads_by_layer has {heads} entries but model.num_layers is {layers}")]
    HeadCountMismatch { heads: usize, layers: usize },

    #[error(
        "scheduler.base_momentum {base} exceeds scheduler.max_momentum {max} \
         while cycle_momentum is enabled"
    )]
    MomentumOrdering { base: f64, max: f64 },
}

pub(super) fn validate(config: &RunConfig) -> Result<(), ConfigError> {
    validate_data(config)?;
    validate_model(config)?;
    validate_optimizer(config)?;
    validate_scheduler(config)?;
    validate_training(config)?;
    Ok(())
}

fn validate_data(config: &RunConfig) -> Result<(), ConfigError> {
    nonzero(config.data.batch_size, "data.batch_size")?;
    nonzero(config.data.accumulation_steps, "data.accumulation_steps")?;
    open_unit(config.data.test_size, "data.test_size")?;
    Ok(())
}

fn validate_model(config: &RunConfig) -> Result<(), ConfigError> {
    let model = &config.model;
    nonzero(model.num_layers, "model.num_layers")?;
    nonzero(model.hidden_dim, "model.hidden_dim")?;
    if model.heads_by_layer.len() != model.num_layers {
        return Err(ConfigError::HeadCountMismatch {
            heads: model.heads_by_layer.len(),
            layers: model.num_layers,
        });
    }
    for &heads in &model.heads_by_layer {
        nonzero(heads, "model.heads_by_layer")?;
    }
    Ok(())
}

fn validate_optimizer(config: &RunConfig) -> Result<(), ConfigError> {
    let optim = &config.optimizer;
    positive(optim.lr, "optimizer.lr")?;
    open_unit(optim.b1, "optimizer.b1")?;
    open_unit(optim.b2, "optimizer.b2")?;
    positive(optim.eps, "optimizer.eps")?;
    positive(optim.clip_grad_norm, "optimizer.clip_grad_norm")?;
    if optim.weight_decay < 0.0 {
        return Err(invalid(
            "optimizer.weight_decay",
            optim.weight_decay,
            ">= 0",
        ));
    }
    if !(0.0..1.0).contains(&optim.dropout) {
        return Err(invalid("optimizer.dropout", optim.dropout, "in [0, 1)"));
    }
    Ok(())
}

fn validate_scheduler(config: &RunConfig) -> Result<(), ConfigError> {
    let sched = &config.scheduler;
    positive(sched.lr_max, "scheduler.lr_max")?;
    open_unit(sched.pct_start, "scheduler.pct_start")?;
    positive(sched.div_factor, "scheduler.div_factor")?;
    positive(sched.final_div_factor, "scheduler.final_div_factor")?;
    if sched.cycle_momentum {
        open_unit(sched.base_momentum, "scheduler.base_momentum")?;
        open_unit(sched.max_momentum, "scheduler.max_momentum")?;
        if sched.base_momentum > sched.max_momentum {
            return Err(ConfigError::MomentumOrdering {
                base: sched.base_momentum,
                max: sched.max_momentum,
            });
        }
    }
    Ok(())
}

fn validate_training(config: &RunConfig) -> Result<(), ConfigError> {
    nonzero(config.training.epochs, "training.epochs")?;
    nonzero(
        config.training.checkpt_save_interval,
        "training.checkpt_save_interval",
    )?;
    Ok(())
}

fn invalid(field: &'static str, value: f64, constraint: &'static str) -> ConfigError {
    ConfigError::InvalidRange {
        field,
        value: value.to_string(),
        constraint,
    }
}

fn positive(value: f64, field: &'static str) -> Result<(), ConfigError> {
    if value <= 0.0 {
        return Err(invalid(field, value, "> 0"));
    }
    Ok(())
}

fn open_unit(value: f64, field: &'static str) -> Result<(), ConfigError> {
    if value <= 0.0 || value >= 1.0 {
        return Err(invalid(field, value, "in (0, 1)"));
    }
    Ok(())
}

fn nonzero(value: usize, field: &'static str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidRange {
            field,
            value: "0".to_string(),
            constraint: ">= 1",
        });
    }
    Ok(())
}

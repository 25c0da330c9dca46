//! Run configuration
//!
//! A training run is described by a section-grouped TOML document. Loading
//! is all-or-nothing: the document is parsed into a typed [`RunConfig`] and
//! every invariant is checked before anything else happens. No partial
//! configuration ever escapes this module.

mod validate;

pub use validate::ConfigError;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Immutable hyperparameter set for one training run.
///
/// Constructed once at process start, then only read. The factories in
/// [`crate::optim`] and [`crate::schedule`] consume shared references and
/// produce the stateful runtime objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub global: GlobalSettings,
    pub data: DataSettings,
    pub model: ModelSettings,
    pub optimizer: OptimizerSettings,
    pub scheduler: SchedulerSettings,
    pub loss: LossSettings,
    pub training: TrainingSettings,
}

impl RunConfig {
    /// Read, parse, and validate a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate a config document from a string.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        validate::validate(&config)?;
        Ok(config)
    }
}

/// Run identity and runtime placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Run name, used in checkpoint snapshots
    pub name: String,

    /// RNG seed handed to the external backend
    pub random_state: u64,

    /// Compute-device identifier resolved by the runtime collaborator
    pub device: String,
}

/// Dataset selection and batching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    /// Dataset identifier resolved by the data-loading collaborator
    pub dataset: String,

    /// Micro-batch size
    pub batch_size: usize,

    /// Micro-batches summed per optimizer step
    pub accumulation_steps: usize,

    /// Train/test split fraction, in (0, 1)
    pub test_size: f64,
}

/// Graph-transformer architecture hyperparameters.
///
/// Consumed by the external model collaborator; this crate only validates
/// them and passes them through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    pub num_layers: usize,
    pub hidden_dim: usize,
    pub edge_embedding_dim: usize,
    pub ffn_hidden_dim: usize,

    /// Attention heads per layer; length must equal `num_layers`
    pub heads_by_layer: Vec<usize>,

    pub max_in_degree: usize,
    pub max_out_degree: usize,

    /// Bound on path distances encoded by the spatial bias
    pub max_path_distance: usize,
}

/// Optimizer-section fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerSettings {
    /// Optimizer name; dispatched by the optimizer factory ("adam", "sgd")
    #[serde(rename = "type")]
    pub kind: String,

    /// Initial step size, overridden per step by the schedule
    pub lr: f64,

    /// First exponential-decay coefficient
    pub b1: f64,

    /// Second exponential-decay coefficient
    pub b2: f64,

    /// Decoupled weight decay
    pub weight_decay: f64,

    /// Numerical-stability term added to the denominator
    pub eps: f64,

    /// Dropout rate handed to the model collaborator
    pub dropout: f64,

    /// Global L2-norm gradient clipping threshold
    pub clip_grad_norm: f64,
}

/// One-cycle schedule fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Scheduler name; dispatched by the scheduler factory ("one-cycle")
    #[serde(rename = "type")]
    pub kind: String,

    /// Peak learning rate reached at the end of warm-up
    pub lr_max: f64,

    /// Fraction of the step budget spent warming up, in (0, 1)
    pub pct_start: f64,

    /// Annealing shape: "cos" or "linear"
    pub anneal_strategy: String,

    /// Cycle momentum inversely to the learning rate
    pub cycle_momentum: bool,

    pub base_momentum: f64,
    pub max_momentum: f64,

    /// Initial lr is `lr_max / div_factor`
    pub div_factor: f64,

    /// Final lr is `lr_max / final_div_factor`
    pub final_div_factor: f64,

    /// Add a symmetric down-phase before the final anneal
    pub three_phase: bool,
}

/// Loss-section fields, consumed by the external loss collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LossSettings {
    pub reduction: LossReduction,
}

/// How the loss collaborator reduces per-sample losses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LossReduction {
    Sum,
    Mean,
}

/// Epoch budget and checkpointing cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSettings {
    pub epochs: usize,

    /// Persist state every N epochs
    pub checkpt_save_interval: usize,

    /// Normalization layer variant used by the model collaborator
    pub norm_type: NormType,
}

/// Normalization variants known to the model collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormType {
    None,
    Layer,
    Rms,
    Crms,
    Max,
}

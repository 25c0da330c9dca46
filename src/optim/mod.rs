//! Optimizers
//!
//! A closed set of optimizer variants built from the `[optimizer]` config
//! section. The `"adam"` variant is Adam with decoupled weight decay; `"sgd"`
//! is classical momentum SGD. Both expose a momentum knob so the one-cycle
//! schedule can cycle it per step.

mod adamw;
mod clip;
mod sgd;

pub use adamw::AdamW;
pub use clip::clip_grad_norm;
pub use sgd::Sgd;

use crate::config::OptimizerSettings;
use crate::param::Parameter;
use thiserror::Error;

/// Trait for optimization algorithms.
pub trait Optimizer {
    /// Perform a single optimization step over all parameters.
    ///
    /// Parameters without a gradient buffer are left untouched.
    fn step(&mut self, params: &mut [Parameter]);

    /// Drop all gradient buffers.
    fn zero_grad(&mut self, params: &mut [Parameter]) {
        for param in params {
            param.zero_grad();
        }
    }

    /// Get the learning rate.
    fn lr(&self) -> f32;

    /// Set the learning rate.
    fn set_lr(&mut self, lr: f32);

    /// Get the momentum-like coefficient the schedule cycles
    /// (beta1 for Adam, velocity momentum for SGD).
    fn momentum(&self) -> f32;

    /// Set the momentum-like coefficient.
    fn set_momentum(&mut self, momentum: f32);
}

/// Optimizer factory errors.
#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("unsupported optimizer type '{0}' (known types: adam, sgd)")]
    Unsupported(String),
}

/// Build an optimizer from validated settings.
pub fn build_optimizer(
    settings: &OptimizerSettings,
) -> Result<Box<dyn Optimizer>, OptimizerError> {
    match settings.kind.as_str() {
        "adam" => Ok(Box::new(AdamW::new(
            settings.lr as f32,
            settings.b1 as f32,
            settings.b2 as f32,
            settings.eps as f32,
            settings.weight_decay as f32,
        ))),
        "sgd" => Ok(Box::new(Sgd::new(
            settings.lr as f32,
            0.0,
            settings.weight_decay as f32,
        ))),
        other => Err(OptimizerError::Unsupported(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(kind: &str) -> OptimizerSettings {
        OptimizerSettings {
            kind: kind.to_string(),
            lr: 3e-4,
            b1: 0.9,
            b2: 0.999,
            weight_decay: 0.01,
            eps: 1e-8,
            dropout: 0.05,
            clip_grad_norm: 5.0,
        }
    }

    #[test]
    fn builds_known_variants() {
        for kind in ["adam", "sgd"] {
            let optimizer = build_optimizer(&settings(kind)).unwrap();
            assert!((optimizer.lr() - 3e-4).abs() < 1e-9);
        }
    }

    #[test]
    fn unknown_type_is_unsupported() {
        let err = build_optimizer(&settings("lamb")).err().unwrap();
        assert!(matches!(err, OptimizerError::Unsupported(name) if name == "lamb"));
    }
}

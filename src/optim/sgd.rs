//! Momentum SGD

use super::Optimizer;
use crate::param::Parameter;
use ndarray::Array1;

/// Stochastic gradient descent with classical momentum.
///
/// v_t = μ * v_{t-1} + g_t + λ * θ_{t-1}
/// θ_t = θ_{t-1} - lr * v_t
pub struct Sgd {
    lr: f32,
    momentum: f32,
    weight_decay: f32,
    velocity: Vec<Option<Array1<f32>>>,
}

impl Sgd {
    pub fn new(lr: f32, momentum: f32, weight_decay: f32) -> Self {
        Self {
            lr,
            momentum,
            weight_decay,
            velocity: Vec::new(),
        }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: &mut [Parameter]) {
        if self.velocity.len() < params.len() {
            self.velocity.resize(params.len(), None);
        }

        for (i, param) in params.iter_mut().enumerate() {
            let Some(grad) = param.grad().cloned() else {
                continue;
            };

            let effective = if self.weight_decay > 0.0 {
                &grad + &(param.data() * self.weight_decay)
            } else {
                grad
            };

            let v_t = match &self.velocity[i] {
                Some(v) if self.momentum > 0.0 => v * self.momentum + &effective,
                _ => effective,
            };

            let updated = param.data() - &(&v_t * self.lr);
            *param.data_mut() = updated;
            self.velocity[i] = Some(v_t);
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn momentum(&self) -> f32 {
        self.momentum
    }

    fn set_momentum(&mut self, momentum: f32) {
        self.momentum = momentum;
    }
}

//! Gradient accumulation
//!
//! Gradients are summed over micro-batches and scaled by
//! `1 / accumulation_steps` when the group is flushed. Clipping happens at
//! flush time, jointly over all parameters, so the clipped quantity is the
//! effective gradient of the whole group.

use crate::optim::clip_grad_norm;
use crate::param::Parameter;
use ndarray::Array1;

/// Tracks micro-batch gradients between optimizer steps.
///
/// The controller exclusively owns the gradient sum buffers while a group
/// is open; [`flush`](Self::flush) hands the scaled, clipped result to the
/// parameters for the optimizer step.
pub struct AccumulationController {
    accumulation_steps: usize,
    clip_grad_norm: f32,
    pending: usize,
    buffers: Vec<Array1<f32>>,
}

impl AccumulationController {
    /// Create a controller with zeroed sum buffers, one per parameter.
    pub fn new(accumulation_steps: usize, clip_grad_norm: f32, param_lens: &[usize]) -> Self {
        Self {
            accumulation_steps: accumulation_steps.max(1),
            clip_grad_norm,
            pending: 0,
            buffers: param_lens.iter().map(|&len| Array1::zeros(len)).collect(),
        }
    }

    /// Add one micro-batch's gradients to the running sums.
    ///
    /// Returns `true` when the group is full and an optimizer step is due.
    pub fn observe_microbatch(&mut self, grads: &[Array1<f32>]) -> bool {
        debug_assert_eq!(grads.len(), self.buffers.len());
        for (buffer, grad) in self.buffers.iter_mut().zip(grads) {
            *buffer += grad;
        }
        self.pending += 1;
        self.pending >= self.accumulation_steps
    }

    /// Micro-batches observed since the last flush.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Scale the accumulated sums, write them into the parameter gradient
    /// slots, and clip the result by global norm.
    ///
    /// Returns the pre-clip global norm, or `None` when nothing was
    /// accumulated. Also called at epoch end so a partial final group is
    /// never dropped.
    pub fn flush(&mut self, params: &mut [Parameter]) -> Option<f32> {
        if self.pending == 0 {
            return None;
        }

        let scale = 1.0 / self.accumulation_steps as f32;
        for (param, buffer) in params.iter_mut().zip(&self.buffers) {
            param.set_grad(buffer * scale);
        }

        let norm = clip_grad_norm(params, self.clip_grad_norm);
        self.reset();
        Some(norm)
    }

    /// Throw away the open group, used on cancellation.
    pub fn discard(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.pending = 0;
        for buffer in &mut self.buffers {
            buffer.fill(0.0);
        }
    }
}

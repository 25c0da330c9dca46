//! Gradient clipping

use crate::param::Parameter;

/// Clip gradients by global norm.
///
/// Computes the joint L2 norm across all gradients and scales every
/// gradient down by the same factor when the norm exceeds `max_norm`, so
/// relative magnitudes between parameters are preserved.
///
/// Returns the global norm before clipping.
pub fn clip_grad_norm(params: &mut [Parameter], max_norm: f32) -> f32 {
    let mut total_norm_sq = 0.0;
    for param in params.iter() {
        if let Some(grad) = param.grad() {
            total_norm_sq += grad.iter().map(|&g| g * g).sum::<f32>();
        }
    }

    let global_norm = total_norm_sq.sqrt();
    if global_norm > max_norm {
        let clip_coef = max_norm / global_norm;
        for param in params.iter_mut() {
            if let Some(grad) = param.grad_mut() {
                *grad *= clip_coef;
            }
        }
    }

    global_norm
}

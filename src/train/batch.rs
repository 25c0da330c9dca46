//! Micro-batch container

use ndarray::Array1;

/// One micro-batch handed to the backend for a forward+backward pass.
#[derive(Debug, Clone)]
pub struct MicroBatch {
    pub inputs: Array1<f32>,
    pub targets: Array1<f32>,
}

impl MicroBatch {
    pub fn new(inputs: Array1<f32>, targets: Array1<f32>) -> Self {
        Self { inputs, targets }
    }
}

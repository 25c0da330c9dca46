//! Parameter buffers
//!
//! A [`Parameter`] is one flat parameter tensor plus its gradient slot. The
//! backend fills gradients, the accumulation controller owns them between
//! optimizer steps, and the optimizer consumes them.

use ndarray::Array1;

/// One parameter tensor with an optional gradient buffer.
#[derive(Debug, Clone)]
pub struct Parameter {
    data: Array1<f32>,
    grad: Option<Array1<f32>>,
}

impl Parameter {
    /// Create a zero-initialized parameter of the given length.
    pub fn zeros(len: usize) -> Self {
        Self {
            data: Array1::zeros(len),
            grad: None,
        }
    }

    /// Create a parameter from explicit values.
    pub fn from_vec(values: Vec<f32>) -> Self {
        Self {
            data: Array1::from(values),
            grad: None,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &Array1<f32> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array1<f32> {
        &mut self.data
    }

    pub fn grad(&self) -> Option<&Array1<f32>> {
        self.grad.as_ref()
    }

    pub fn grad_mut(&mut self) -> Option<&mut Array1<f32>> {
        self.grad.as_mut()
    }

    /// Replace the gradient buffer.
    pub fn set_grad(&mut self, grad: Array1<f32>) {
        debug_assert_eq!(grad.len(), self.data.len());
        self.grad = Some(grad);
    }

    /// Drop the gradient buffer.
    pub fn zero_grad(&mut self) {
        self.grad = None;
    }
}

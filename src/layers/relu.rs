//! ReLU activation layer

use crate::error::{CnnError, CnnResult};
use crate::layers::Layer;
use crate::tensor::Tensor;

/// Elementwise `max(0, x)`.
///
/// Caches a sign mask of the forward input; backward lets the gradient through
/// only where the input was strictly positive.
#[derive(Debug, Default)]
pub struct ReLU {
    active: Vec<bool>,
    shape: Option<Vec<usize>>,
}

impl ReLU {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Layer for ReLU {
    fn forward(&mut self, input: &Tensor) -> CnnResult<Tensor> {
        self.active.clear();
        self.active.extend(input.data().iter().map(|&v| v > 0.0));
        self.shape = Some(input.shape().to_vec());

        let data = input.data().iter().map(|&v| v.max(0.0)).collect();
        Tensor::new(input.shape().to_vec(), data)
    }

    fn backward(&mut self, grad_output: &Tensor, _learning_rate: f32) -> CnnResult<Tensor> {
        let shape = self
            .shape
            .as_ref()
            .ok_or(CnnError::MissingCache { layer: "ReLU" })?;
        if grad_output.shape() != shape.as_slice() {
            return Err(CnnError::shape("ReLU", shape, grad_output.shape()));
        }

        let data = grad_output
            .data()
            .iter()
            .zip(&self.active)
            .map(|(&g, &on)| if on { g } else { 0.0 })
            .collect();
        Tensor::new(shape.clone(), data)
    }

    fn parameter_count(&self) -> usize {
        0
    }

    fn name(&self) -> &'static str {
        "ReLU"
    }
}

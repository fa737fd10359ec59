//! Flatten layer: `(N, H, W, C)` to `(N, H·W·C)` and back.

use crate::error::{CnnError, CnnResult};
use crate::layers::Layer;
use crate::tensor::Tensor;

/// Parameter-free reshape between spatial and vector layouts.
///
/// Row-major order is preserved, so forward and backward only swap shapes. The
/// original shape is cached because the flattened gradient cannot recover it.
#[derive(Debug, Default)]
pub struct Flatten {
    input_shape: Option<Vec<usize>>,
}

impl Flatten {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Layer for Flatten {
    fn forward(&mut self, input: &Tensor) -> CnnResult<Tensor> {
        let n = input.batch_size();
        if input.shape().len() < 2 || n == 0 {
            return Err(CnnError::shape("Flatten", &[1, 1], input.shape()));
        }
        let features = input.len() / n;
        self.input_shape = Some(input.shape().to_vec());
        input.clone().reshape(vec![n, features])
    }

    fn backward(&mut self, grad_output: &Tensor, _learning_rate: f32) -> CnnResult<Tensor> {
        let shape = self
            .input_shape
            .as_ref()
            .ok_or(CnnError::MissingCache { layer: "Flatten" })?;
        let n = shape[0];
        let features: usize = shape[1..].iter().product();
        if grad_output.shape() != [n, features] {
            return Err(CnnError::shape("Flatten", &[n, features], grad_output.shape()));
        }
        grad_output.clone().reshape(shape.clone())
    }

    fn parameter_count(&self) -> usize {
        0
    }

    fn name(&self) -> &'static str {
        "Flatten"
    }
}

//! Layer trait definition for neural network layers
//!
//! Every layer in the pipeline implements a forward operation and a paired
//! backward operation. Whatever the backward pass needs (inputs, masks, argmax
//! positions, shapes) is cached by the layer itself during forward.

use crate::error::CnnResult;
use crate::tensor::Tensor;

/// Core trait for neural network layers.
///
/// # Example
///
/// ```
/// use catnn::layers::{Layer, ReLU};
/// use catnn::tensor::Tensor;
///
/// let mut relu = ReLU::new();
/// let input = Tensor::new(vec![1, 3], vec![-1.0, 0.5, 2.0]).unwrap();
/// let output = relu.forward(&input).unwrap();
/// assert_eq!(output.data(), &[0.0, 0.5, 2.0]);
///
/// let grad = Tensor::new(vec![1, 3], vec![1.0, 1.0, 1.0]).unwrap();
/// let grad_input = relu.backward(&grad, 0.0).unwrap();
/// assert_eq!(grad_input.data(), &[0.0, 1.0, 1.0]);
/// ```
pub trait Layer {
    /// Forward propagation through the layer.
    ///
    /// Computes the layer output and caches what the backward pass will need.
    ///
    /// # Errors
    ///
    /// Returns `CnnError::ShapeMismatch` when `input` does not fit the layer's
    /// configured shape.
    fn forward(&mut self, input: &Tensor) -> CnnResult<Tensor>;

    /// Backward propagation through the layer.
    ///
    /// Consumes the gradient of the loss with respect to this layer's output and
    /// returns the gradient with respect to its input. Learnable layers update
    /// their parameters in place with `learning_rate` before returning; the
    /// input gradient is always computed with the pre-update parameters.
    /// Parameter-free layers ignore `learning_rate`.
    ///
    /// # Errors
    ///
    /// `CnnError::MissingCache` if no forward pass preceded this call, and
    /// `CnnError::ShapeMismatch` if `grad_output` does not match the last output.
    fn backward(&mut self, grad_output: &Tensor, learning_rate: f32) -> CnnResult<Tensor>;

    /// Number of trainable parameters (weights plus biases).
    fn parameter_count(&self) -> usize;

    /// Short layer name used in errors and logs.
    fn name(&self) -> &'static str;
}

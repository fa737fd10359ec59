//! Dropout layer implementation for regularization
//!
//! During training, randomly zeroes a fraction of input units and scales the rest
//! by 1/(1-p) (inverted dropout). During evaluation, inputs pass through
//! unchanged.

use crate::error::{CnnError, CnnResult};
use crate::layers::Layer;
use crate::tensor::Tensor;
use crate::utils::SimpleRng;

/// Whether a mode-dependent layer behaves as in training or inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Training,
    Evaluation,
}

/// Dropout layer for regularization.
///
/// # Fields
///
/// * `drop_rate` - Probability of dropping each unit, in [0, 1)
/// * `mode` - Training or evaluation behaviour, switched by the owner
/// * `mask` - Per-element factor from the last training forward pass
///   (0 for dropped units, 1/(1-p) for kept ones)
/// * `rng` - Generator for dropout masks
///
/// # Example
///
/// ```
/// use catnn::layers::{Dropout, Layer, Mode};
/// use catnn::tensor::Tensor;
/// use catnn::utils::SimpleRng;
///
/// let mut layer = Dropout::new(0.25, SimpleRng::new(42)).unwrap();
/// layer.set_mode(Mode::Evaluation);
/// let x = Tensor::new(vec![1, 4], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// assert_eq!(layer.forward(&x).unwrap(), x);
/// ```
#[derive(Debug)]
pub struct Dropout {
    drop_rate: f32,
    mode: Mode,
    mask: Vec<f32>,
    mask_shape: Option<Vec<usize>>,
    rng: SimpleRng,
}

impl Dropout {
    /// Creates a new dropout layer in training mode.
    ///
    /// # Errors
    ///
    /// `CnnError::Configuration` if `drop_rate` is outside [0, 1).
    pub fn new(drop_rate: f32, rng: SimpleRng) -> CnnResult<Self> {
        if !(0.0..1.0).contains(&drop_rate) {
            return Err(CnnError::Configuration(format!(
                "drop_rate must be in range [0.0, 1.0), got {}",
                drop_rate
            )));
        }
        Ok(Self {
            drop_rate,
            mode: Mode::Training,
            mask: Vec::new(),
            mask_shape: None,
            rng,
        })
    }

    pub fn drop_rate(&self) -> f32 {
        self.drop_rate
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Shorthand for `set_mode(Mode::Training)`.
    pub fn train(&mut self) {
        self.set_mode(Mode::Training);
    }

    /// Shorthand for `set_mode(Mode::Evaluation)`.
    pub fn eval(&mut self) {
        self.set_mode(Mode::Evaluation);
    }

    fn scale(&self) -> f32 {
        1.0 / (1.0 - self.drop_rate)
    }
}

impl Layer for Dropout {
    fn forward(&mut self, input: &Tensor) -> CnnResult<Tensor> {
        if self.mode == Mode::Evaluation {
            return Ok(input.clone());
        }

        let scale = self.scale();
        let keep_prob = 1.0 - self.drop_rate;
        self.mask.clear();
        for _ in 0..input.len() {
            let keep = self.rng.next_f32() < keep_prob;
            self.mask.push(if keep { scale } else { 0.0 });
        }
        self.mask_shape = Some(input.shape().to_vec());

        let data = input
            .data()
            .iter()
            .zip(&self.mask)
            .map(|(&x, &m)| x * m)
            .collect();
        Tensor::new(input.shape().to_vec(), data)
    }

    fn backward(&mut self, grad_output: &Tensor, _learning_rate: f32) -> CnnResult<Tensor> {
        if self.mode == Mode::Evaluation {
            return Ok(grad_output.clone());
        }

        let shape = self
            .mask_shape
            .as_ref()
            .ok_or(CnnError::MissingCache { layer: "Dropout" })?;
        if grad_output.shape() != shape.as_slice() {
            return Err(CnnError::shape("Dropout", shape, grad_output.shape()));
        }

        // mask already carries the 1/(1-p) factor
        let data = grad_output
            .data()
            .iter()
            .zip(&self.mask)
            .map(|(&g, &m)| g * m)
            .collect();
        Tensor::new(shape.clone(), data)
    }

    fn parameter_count(&self) -> usize {
        0
    }

    fn name(&self) -> &'static str {
        "Dropout"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropout_layer_creation() {
        let layer = Dropout::new(0.5, SimpleRng::new(42)).unwrap();
        assert_eq!(layer.drop_rate(), 0.5);
        assert_eq!(layer.mode(), Mode::Training);
        assert_eq!(layer.parameter_count(), 0);
    }

    #[test]
    fn test_dropout_invalid_rate() {
        assert!(matches!(
            Dropout::new(1.0, SimpleRng::new(42)),
            Err(CnnError::Configuration(_))
        ));
        assert!(Dropout::new(-0.1, SimpleRng::new(42)).is_err());
        assert!(Dropout::new(f32::NAN, SimpleRng::new(42)).is_err());
    }

    #[test]
    fn test_dropout_zero_rate_is_identity() {
        let mut layer = Dropout::new(0.0, SimpleRng::new(42)).unwrap();
        let input = Tensor::new(vec![1, 5], vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let output = layer.forward(&input).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_dropout_mode_toggle() {
        let mut layer = Dropout::new(0.25, SimpleRng::new(42)).unwrap();
        layer.eval();
        assert_eq!(layer.mode(), Mode::Evaluation);
        layer.train();
        assert_eq!(layer.mode(), Mode::Training);
    }

    #[test]
    fn test_dropout_backward_before_forward() {
        let mut layer = Dropout::new(0.5, SimpleRng::new(42)).unwrap();
        let grad = Tensor::zeros(vec![1, 3]);
        assert!(matches!(
            layer.backward(&grad, 0.0),
            Err(CnnError::MissingCache { .. })
        ));
    }
}

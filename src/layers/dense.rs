//! Dense (fully connected) layer implementation
//!
//! Performs the transformation: output = input × weights + biases

use crate::error::{CnnError, CnnResult};
use crate::layers::Layer;
use crate::tensor::Tensor;
use crate::utils::SimpleRng;

/// Dense (fully connected) layer with weights and biases.
///
/// Performs y = xW + b where x is `(N, input_size)`, W is
/// `(input_size, output_size)` row-major and b is `(output_size)`.
///
/// # Example
///
/// ```
/// use catnn::layers::Dense;
/// use catnn::utils::SimpleRng;
///
/// let mut rng = SimpleRng::new(42);
/// let layer = Dense::new(16 * 59 * 59, 5, &mut rng).unwrap();
/// assert_eq!(layer.input_size(), 55696);
/// assert_eq!(layer.output_size(), 5);
/// ```
#[derive(Debug)]
pub struct Dense {
    input_size: usize,
    output_size: usize,
    weights: Vec<f32>,
    biases: Vec<f32>,
    cached_input: Option<Tensor>,
}

impl Dense {
    /// Create a new Dense layer with Xavier initialization.
    ///
    /// Weights are uniform in [-limit, limit] with
    /// limit = sqrt(6 / (input_size + output_size)); biases start at zero.
    ///
    /// # Errors
    ///
    /// `CnnError::Configuration` if either size is zero.
    pub fn new(input_size: usize, output_size: usize, rng: &mut SimpleRng) -> CnnResult<Self> {
        if input_size == 0 || output_size == 0 {
            return Err(CnnError::Configuration(format!(
                "Dense sizes must be positive (in={}, out={})",
                input_size, output_size
            )));
        }

        let limit = (6.0f32 / (input_size + output_size) as f32).sqrt();
        let weights = (0..input_size * output_size)
            .map(|_| rng.gen_range_f32(-limit, limit))
            .collect();

        Ok(Self {
            input_size,
            output_size,
            weights,
            biases: vec![0.0f32; output_size],
            cached_input: None,
        })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Weight matrix, `(input_size, output_size)` row-major.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    /// Replace the weight matrix and biases, e.g. with externally trained values.
    pub fn set_parameters(&mut self, weights: Vec<f32>, biases: Vec<f32>) -> CnnResult<()> {
        if weights.len() != self.weights.len() {
            return Err(CnnError::shape(
                "Dense",
                &[self.input_size, self.output_size],
                &[weights.len()],
            ));
        }
        if biases.len() != self.output_size {
            return Err(CnnError::shape("Dense", &[self.output_size], &[biases.len()]));
        }
        self.weights = weights;
        self.biases = biases;
        Ok(())
    }
}

impl Layer for Dense {
    fn forward(&mut self, input: &Tensor) -> CnnResult<Tensor> {
        let (n, features) = input.dims2("Dense")?;
        if features != self.input_size {
            return Err(CnnError::shape(
                "Dense",
                &[n, self.input_size],
                input.shape(),
            ));
        }

        let x = input.data();
        let mut output = vec![0.0f32; n * self.output_size];
        for b in 0..n {
            let in_row = &x[b * self.input_size..(b + 1) * self.input_size];
            let out_row = &mut output[b * self.output_size..(b + 1) * self.output_size];
            out_row.copy_from_slice(&self.biases);

            for (i, &xi) in in_row.iter().enumerate() {
                if xi == 0.0 {
                    continue;
                }
                let w_row = &self.weights[i * self.output_size..(i + 1) * self.output_size];
                for (o, &wij) in out_row.iter_mut().zip(w_row) {
                    *o += xi * wij;
                }
            }
        }

        self.cached_input = Some(input.clone());
        Tensor::new(vec![n, self.output_size], output)
    }

    fn backward(&mut self, grad_output: &Tensor, learning_rate: f32) -> CnnResult<Tensor> {
        let input = self
            .cached_input
            .as_ref()
            .ok_or(CnnError::MissingCache { layer: "Dense" })?;
        let n = input.batch_size();
        if grad_output.shape() != [n, self.output_size] {
            return Err(CnnError::shape(
                "Dense",
                &[n, self.output_size],
                grad_output.shape(),
            ));
        }

        let x = input.data();
        let g = grad_output.data();
        let mut grad_w = vec![0.0f32; self.weights.len()];
        let mut grad_b = vec![0.0f32; self.output_size];
        let mut grad_input = vec![0.0f32; n * self.input_size];

        // The 1/N batch factor is already folded into grad_output by the loss.
        for b in 0..n {
            let g_row = &g[b * self.output_size..(b + 1) * self.output_size];
            for (gb, &go) in grad_b.iter_mut().zip(g_row) {
                *gb += go;
            }

            for i in 0..self.input_size {
                let xi = x[b * self.input_size + i];
                let w_row = &self.weights[i * self.output_size..(i + 1) * self.output_size];
                let gw_row = &mut grad_w[i * self.output_size..(i + 1) * self.output_size];

                let mut acc = 0.0f32;
                for j in 0..self.output_size {
                    gw_row[j] += xi * g_row[j];
                    acc += g_row[j] * w_row[j];
                }
                grad_input[b * self.input_size + i] = acc;
            }
        }

        for (w, gw) in self.weights.iter_mut().zip(&grad_w) {
            *w -= learning_rate * gw;
        }
        for (bias, gb) in self.biases.iter_mut().zip(&grad_b) {
            *bias -= learning_rate * gb;
        }

        Tensor::new(vec![n, self.input_size], grad_input)
    }

    fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    fn name(&self) -> &'static str {
        "Dense"
    }
}

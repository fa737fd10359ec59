//! 2D Convolutional layer implementation
//!
//! Stride 1, no padding: a `k × k` kernel shrinks each spatial axis by `k - 1`.
//! Tensors are channels-last, `(N, H, W, C)`.

use crate::error::{CnnError, CnnResult};
use crate::layers::Layer;
use crate::tensor::Tensor;
use crate::utils::SimpleRng;

/// 2D Convolutional layer with learnable filters.
///
/// # Fields
///
/// * `in_channels` - Number of input channels (3 for RGB)
/// * `out_channels` - Number of output feature maps (number of filters)
/// * `kernel_size` - Size of the square kernel
/// * `input_height` - Height of input feature map
/// * `input_width` - Width of input feature map
/// * `weights` - Filter bank laid out `(out_channels, kernel, kernel, in_channels)`
/// * `biases` - Bias for each output channel
/// * `cached_input` - Input of the last forward pass, needed for filter gradients
///
/// # Example
///
/// ```
/// use catnn::layers::Conv2D;
/// use catnn::utils::SimpleRng;
///
/// let mut rng = SimpleRng::new(42);
/// let layer = Conv2D::new(3, 16, 3, 120, 120, &mut rng).unwrap();
/// assert_eq!(layer.output_height(), 118);
/// assert_eq!(layer.output_width(), 118);
/// ```
#[derive(Debug)]
pub struct Conv2D {
    in_channels: usize,
    out_channels: usize,
    kernel_size: usize,
    input_height: usize,
    input_width: usize,
    weights: Vec<f32>,
    biases: Vec<f32>,
    cached_input: Option<Tensor>,
}

impl Conv2D {
    /// Create a new Conv2D with Xavier initialization.
    ///
    /// fan_in = in_channels × kernel², fan_out = out_channels × kernel²,
    /// weights uniform in [-limit, limit] with limit = sqrt(6 / (fan_in + fan_out)).
    /// Biases start at zero.
    ///
    /// # Errors
    ///
    /// `CnnError::Configuration` for zero channels, a zero kernel, or a kernel
    /// larger than either input dimension.
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        input_height: usize,
        input_width: usize,
        rng: &mut SimpleRng,
    ) -> CnnResult<Self> {
        if in_channels == 0 || out_channels == 0 {
            return Err(CnnError::Configuration(format!(
                "Conv2D channel counts must be positive (in={}, out={})",
                in_channels, out_channels
            )));
        }
        if kernel_size == 0 {
            return Err(CnnError::Configuration(
                "Conv2D kernel_size must be positive".to_string(),
            ));
        }
        if kernel_size > input_height || kernel_size > input_width {
            return Err(CnnError::Configuration(format!(
                "Conv2D kernel {}x{} does not fit a {}x{} input",
                kernel_size, kernel_size, input_height, input_width
            )));
        }

        let fan_in = (in_channels * kernel_size * kernel_size) as f32;
        let fan_out = (out_channels * kernel_size * kernel_size) as f32;
        let limit = (6.0f32 / (fan_in + fan_out)).sqrt();

        let weight_count = out_channels * kernel_size * kernel_size * in_channels;
        let weights = (0..weight_count)
            .map(|_| rng.gen_range_f32(-limit, limit))
            .collect();

        Ok(Self {
            in_channels,
            out_channels,
            kernel_size,
            input_height,
            input_width,
            weights,
            biases: vec![0.0f32; out_channels],
            cached_input: None,
        })
    }

    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    pub fn output_height(&self) -> usize {
        self.input_height - self.kernel_size + 1
    }

    pub fn output_width(&self) -> usize {
        self.input_width - self.kernel_size + 1
    }

    /// Filter bank, `(out_channels, kernel, kernel, in_channels)` row-major.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    /// Replace the filter bank and biases, e.g. with externally trained values.
    pub fn set_parameters(&mut self, weights: Vec<f32>, biases: Vec<f32>) -> CnnResult<()> {
        if weights.len() != self.weights.len() {
            return Err(CnnError::shape(
                "Conv2D",
                &[self.out_channels, self.kernel_size, self.kernel_size, self.in_channels],
                &[weights.len()],
            ));
        }
        if biases.len() != self.out_channels {
            return Err(CnnError::shape("Conv2D", &[self.out_channels], &[biases.len()]));
        }
        self.weights = weights;
        self.biases = biases;
        Ok(())
    }

    #[inline]
    fn weight_index(&self, oc: usize, ky: usize, kx: usize, ic: usize) -> usize {
        ((oc * self.kernel_size + ky) * self.kernel_size + kx) * self.in_channels + ic
    }
}

impl Layer for Conv2D {
    fn forward(&mut self, input: &Tensor) -> CnnResult<Tensor> {
        let (n, h, w, c) = input.dims4("Conv2D")?;
        if h != self.input_height || w != self.input_width || c != self.in_channels {
            return Err(CnnError::shape(
                "Conv2D",
                &[n, self.input_height, self.input_width, self.in_channels],
                input.shape(),
            ));
        }

        let out_h = self.output_height();
        let out_w = self.output_width();
        let k = self.kernel_size;
        let x = input.data();
        let mut output = vec![0.0f32; n * out_h * out_w * self.out_channels];

        for b in 0..n {
            let in_base = b * h * w * c;
            let out_base = b * out_h * out_w * self.out_channels;

            for oy in 0..out_h {
                for ox in 0..out_w {
                    let out_pos = out_base + (oy * out_w + ox) * self.out_channels;

                    for oc in 0..self.out_channels {
                        let mut sum = self.biases[oc];
                        for ky in 0..k {
                            let row = in_base + ((oy + ky) * w + ox) * c;
                            for kx in 0..k {
                                let pixel = row + kx * c;
                                let w_base = self.weight_index(oc, ky, kx, 0);
                                for ic in 0..c {
                                    sum += x[pixel + ic] * self.weights[w_base + ic];
                                }
                            }
                        }
                        output[out_pos + oc] = sum;
                    }
                }
            }
        }

        self.cached_input = Some(input.clone());
        Tensor::new(vec![n, out_h, out_w, self.out_channels], output)
    }

    fn backward(&mut self, grad_output: &Tensor, learning_rate: f32) -> CnnResult<Tensor> {
        let input = self
            .cached_input
            .as_ref()
            .ok_or(CnnError::MissingCache { layer: "Conv2D" })?;
        let (n, h, w, c) = input.dims4("Conv2D")?;
        let out_h = self.output_height();
        let out_w = self.output_width();
        let expected = [n, out_h, out_w, self.out_channels];
        if grad_output.shape() != expected {
            return Err(CnnError::shape("Conv2D", &expected, grad_output.shape()));
        }

        let k = self.kernel_size;
        let x = input.data();
        let g = grad_output.data();
        let mut grad_w = vec![0.0f32; self.weights.len()];
        let mut grad_b = vec![0.0f32; self.out_channels];
        let mut grad_input = vec![0.0f32; x.len()];

        for b in 0..n {
            let in_base = b * h * w * c;
            let out_base = b * out_h * out_w * self.out_channels;

            for oy in 0..out_h {
                for ox in 0..out_w {
                    let out_pos = out_base + (oy * out_w + ox) * self.out_channels;

                    for oc in 0..self.out_channels {
                        let go = g[out_pos + oc];
                        grad_b[oc] += go;
                        if go == 0.0 {
                            continue;
                        }
                        for ky in 0..k {
                            let row = in_base + ((oy + ky) * w + ox) * c;
                            for kx in 0..k {
                                let pixel = row + kx * c;
                                let w_base = self.weight_index(oc, ky, kx, 0);
                                for ic in 0..c {
                                    grad_w[w_base + ic] += go * x[pixel + ic];
                                    // overlapping windows accumulate here
                                    grad_input[pixel + ic] += go * self.weights[w_base + ic];
                                }
                            }
                        }
                    }
                }
            }
        }

        for (wt, gw) in self.weights.iter_mut().zip(&grad_w) {
            *wt -= learning_rate * gw;
        }
        for (bias, gb) in self.biases.iter_mut().zip(&grad_b) {
            *bias -= learning_rate * gb;
        }

        Tensor::new(input.shape().to_vec(), grad_input)
    }

    fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    fn name(&self) -> &'static str {
        "Conv2D"
    }
}

//! 2D max pooling layer
//!
//! Downsamples the spatial axes of an `(N, H, W, C)` tensor; the channel count is
//! unchanged. The position of each window's maximum is remembered so backward
//! can route the gradient to it.

use crate::error::{CnnError, CnnResult};
use crate::layers::Layer;
use crate::tensor::Tensor;

/// Max pooling over `size × size` windows moved by `stride`.
///
/// Output size per axis is `(in - size) / stride + 1` (floor). Ties inside a
/// window resolve to the first maximum in row-major scan order.
#[derive(Debug)]
pub struct MaxPool2D {
    size: usize,
    stride: usize,
    /// Flat input offset of the maximum for every output element. Overwritten
    /// on each forward call.
    argmax: Vec<usize>,
    input_shape: Option<Vec<usize>>,
    output_shape: Vec<usize>,
}

impl MaxPool2D {
    /// # Errors
    ///
    /// `CnnError::Configuration` when `size` or `stride` is zero.
    pub fn new(size: usize, stride: usize) -> CnnResult<Self> {
        if size == 0 || stride == 0 {
            return Err(CnnError::Configuration(format!(
                "MaxPool2D size and stride must be positive (size={}, stride={})",
                size, stride
            )));
        }
        Ok(Self {
            size,
            stride,
            argmax: Vec::new(),
            input_shape: None,
            output_shape: Vec::new(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Output spatial length for an input axis of length `len`, or `None` when
    /// the window does not fit.
    pub fn output_len(&self, len: usize) -> Option<usize> {
        len.checked_sub(self.size).map(|d| d / self.stride + 1)
    }

    /// Argmax offsets recorded by the last forward pass.
    pub fn argmax(&self) -> &[usize] {
        &self.argmax
    }
}

impl Layer for MaxPool2D {
    fn forward(&mut self, input: &Tensor) -> CnnResult<Tensor> {
        let (n, h, w, c) = input.dims4("MaxPool2D")?;
        let (Some(out_h), Some(out_w)) = (self.output_len(h), self.output_len(w)) else {
            return Err(CnnError::shape(
                "MaxPool2D",
                &[n, self.size, self.size, c],
                input.shape(),
            ));
        };

        let x = input.data();
        let mut output = vec![0.0f32; n * out_h * out_w * c];
        self.argmax.clear();
        self.argmax.resize(output.len(), 0);

        for b in 0..n {
            let in_base = b * h * w * c;
            let out_base = b * out_h * out_w * c;

            for py in 0..out_h {
                for px in 0..out_w {
                    let iy0 = py * self.stride;
                    let ix0 = px * self.stride;

                    for ch in 0..c {
                        let mut best = f32::NEG_INFINITY;
                        let mut best_idx = in_base + (iy0 * w + ix0) * c + ch;

                        for dy in 0..self.size {
                            for dx in 0..self.size {
                                let idx = in_base + ((iy0 + dy) * w + ix0 + dx) * c + ch;
                                if x[idx] > best {
                                    best = x[idx];
                                    best_idx = idx;
                                }
                            }
                        }

                        let out_i = out_base + (py * out_w + px) * c + ch;
                        output[out_i] = best;
                        self.argmax[out_i] = best_idx;
                    }
                }
            }
        }

        self.input_shape = Some(input.shape().to_vec());
        self.output_shape = vec![n, out_h, out_w, c];
        Tensor::new(self.output_shape.clone(), output)
    }

    fn backward(&mut self, grad_output: &Tensor, _learning_rate: f32) -> CnnResult<Tensor> {
        let input_shape = self
            .input_shape
            .as_ref()
            .ok_or(CnnError::MissingCache { layer: "MaxPool2D" })?;
        if grad_output.shape() != self.output_shape.as_slice() {
            return Err(CnnError::shape(
                "MaxPool2D",
                &self.output_shape,
                grad_output.shape(),
            ));
        }

        let mut grad_input = Tensor::zeros(input_shape.clone());
        let gi = grad_input.data_mut();
        for (&g, &src) in grad_output.data().iter().zip(&self.argmax) {
            // overlapping windows may share an argmax
            gi[src] += g;
        }
        Ok(grad_input)
    }

    fn parameter_count(&self) -> usize {
        0
    }

    fn name(&self) -> &'static str {
        "MaxPool2D"
    }
}

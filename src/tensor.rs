//! Minimal dense tensor used between layers
//!
//! A `Tensor` is a flat row-major `Vec<f32>` paired with its shape. Image batches
//! are 4-D `(N, H, W, C)`; feature matrices are 2-D `(N, F)`.

use crate::error::{CnnError, CnnResult};

/// Row-major f32 tensor with an explicit shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Wrap `data` with `shape`. The element count must match the shape product.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> CnnResult<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(CnnError::shape("Tensor", &[expected], &[data.len()]));
        }
        Ok(Self { shape, data })
    }

    /// All-zero tensor of the given shape.
    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![0.0f32; len],
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Leading (batch) dimension, or 0 for a rank-0 tensor.
    pub fn batch_size(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// Unpack a rank-4 `(N, H, W, C)` shape.
    pub fn dims4(&self, layer: &'static str) -> CnnResult<(usize, usize, usize, usize)> {
        match self.shape.as_slice() {
            &[n, h, w, c] => Ok((n, h, w, c)),
            other => Err(CnnError::ShapeMismatch {
                layer,
                expected: vec![0; 4],
                actual: other.to_vec(),
            }),
        }
    }

    /// Unpack a rank-2 `(N, F)` shape.
    pub fn dims2(&self, layer: &'static str) -> CnnResult<(usize, usize)> {
        match self.shape.as_slice() {
            &[n, f] => Ok((n, f)),
            other => Err(CnnError::ShapeMismatch {
                layer,
                expected: vec![0; 2],
                actual: other.to_vec(),
            }),
        }
    }

    /// Reinterpret the data under a new shape with the same element count.
    pub fn reshape(self, shape: Vec<usize>) -> CnnResult<Self> {
        let expected: usize = shape.iter().product();
        if expected != self.data.len() {
            return Err(CnnError::ShapeMismatch {
                layer: "Tensor",
                expected: shape,
                actual: self.shape,
            });
        }
        Ok(Self {
            shape,
            data: self.data,
        })
    }

    /// True when no element is NaN or infinite.
    pub fn all_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        let result = Tensor::new(vec![2, 3], vec![0.0; 5]);
        assert!(matches!(result, Err(CnnError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_dims4() {
        let t = Tensor::zeros(vec![2, 4, 5, 3]);
        assert_eq!(t.dims4("test").unwrap(), (2, 4, 5, 3));
        assert!(t.dims2("test").is_err());
        assert_eq!(t.batch_size(), 2);
    }

    #[test]
    fn test_reshape_preserves_order() {
        let t = Tensor::new(vec![1, 2, 2, 1], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let flat = t.reshape(vec![1, 4]).unwrap();
        assert_eq!(flat.shape(), &[1, 4]);
        assert_eq!(flat.data(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_reshape_rejects_wrong_count() {
        let t = Tensor::zeros(vec![2, 3]);
        assert!(t.reshape(vec![7]).is_err());
    }

    #[test]
    fn test_all_finite() {
        let mut t = Tensor::zeros(vec![3]);
        assert!(t.all_finite());
        t.data_mut()[1] = f32::NAN;
        assert!(!t.all_finite());
    }
}

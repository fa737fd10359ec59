//! Softmax cross-entropy loss
//!
//! When softmax feeds straight into cross-entropy, the gradient with respect to
//! the logits collapses to `(P - Y) / N`. The classifier uses that closed form
//! instead of chaining separate softmax and cross-entropy derivatives.

use crate::error::{CnnError, CnnResult};
use crate::tensor::Tensor;

/// Lower bound applied to probabilities before taking the log.
const LOG_EPS: f32 = 1e-9;

/// Softmax applied row-wise in place.
///
/// Uses the max-subtraction trick for numerical stability to avoid overflow
/// with large logits.
pub fn softmax_rows(outputs: &mut [f32], rows: usize, cols: usize) {
    if cols == 0 {
        return;
    }

    for row in outputs.chunks_exact_mut(cols).take(rows) {
        let max_value = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        let mut sum = 0.0f32;
        for value in row.iter_mut() {
            *value = (*value - max_value).exp();
            sum += *value;
        }

        let inv_sum = 1.0f32 / sum;
        for value in row.iter_mut() {
            *value *= inv_sum;
        }
    }
}

/// Mean cross-entropy of softmax(logits) against one-hot targets.
///
/// Returns the scalar loss `-mean(sum(Y * ln P))` together with the
/// probability matrix P.
pub fn cross_entropy_loss(one_hot: &Tensor, logits: &Tensor) -> CnnResult<(f32, Tensor)> {
    let (n, k) = logits.dims2("loss")?;
    if one_hot.shape() != logits.shape() {
        return Err(CnnError::shape("loss", logits.shape(), one_hot.shape()));
    }

    let mut probs = logits.clone();
    softmax_rows(probs.data_mut(), n, k);

    let total: f32 = one_hot
        .data()
        .iter()
        .zip(probs.data())
        .filter(|(y, _)| **y != 0.0)
        .map(|(&y, &p)| -y * p.max(LOG_EPS).ln())
        .sum();
    let loss = if n == 0 { 0.0 } else { total / n as f32 };

    Ok((loss, probs))
}

/// Fused softmax + cross-entropy gradient with respect to the logits:
/// `(P - Y) / N`.
pub fn softmax_cross_entropy_grad(probs: &Tensor, one_hot: &Tensor) -> CnnResult<Tensor> {
    let (n, _) = probs.dims2("loss")?;
    if one_hot.shape() != probs.shape() {
        return Err(CnnError::shape("loss", probs.shape(), one_hot.shape()));
    }

    let scale = 1.0 / n.max(1) as f32;
    let data = probs
        .data()
        .iter()
        .zip(one_hot.data())
        .map(|(&p, &y)| (p - y) * scale)
        .collect();
    Tensor::new(probs.shape().to_vec(), data)
}

/// Index of the largest value in each row; ties resolve to the lowest index.
pub fn argmax_rows(matrix: &Tensor) -> CnnResult<Vec<usize>> {
    let (_, k) = matrix.dims2("argmax")?;
    if k == 0 {
        return Err(CnnError::shape("argmax", &[0, 1], matrix.shape()));
    }

    Ok(matrix
        .data()
        .chunks_exact(k)
        .map(|row| {
            let mut best = 0usize;
            for j in 1..row.len() {
                if row[j] > row[best] {
                    best = j;
                }
            }
            best
        })
        .collect())
}

/// Fraction of rows whose argmax equals the true label index.
pub fn accuracy(probs: &Tensor, labels: &[usize]) -> CnnResult<f32> {
    let predicted = argmax_rows(probs)?;
    if predicted.len() != labels.len() {
        return Err(CnnError::shape("accuracy", &[labels.len()], &[predicted.len()]));
    }
    if labels.is_empty() {
        return Ok(0.0);
    }

    let correct = predicted
        .iter()
        .zip(labels)
        .filter(|(p, l)| p == l)
        .count();
    Ok(correct as f32 / labels.len() as f32)
}

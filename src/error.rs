//! Error types for the classifier
//!
//! Every fallible operation in the crate returns `CnnResult<T>`. Errors are
//! fatal for the batch being processed; nothing is retried internally.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type CnnResult<T> = Result<T, CnnError>;

/// All error conditions surfaced by layers, the classifier and config loading.
#[derive(Debug, Error)]
pub enum CnnError {
    /// Invalid construction parameters (kernel larger than input, zero channels,
    /// drop probability outside [0, 1), bad schedule values, ...).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A tensor whose dimensions do not match what the receiver expects.
    #[error("shape mismatch in {layer}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        layer: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A label outside the fixed category vocabulary.
    #[error("unknown label '{0}'")]
    LabelLookup(String),

    /// Backward was called without a preceding forward pass.
    #[error("{layer}: backward called before forward")]
    MissingCache { layer: &'static str },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

impl CnnError {
    pub(crate) fn shape(layer: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        CnnError::ShapeMismatch {
            layer,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = CnnError::shape("Dense", &[4, 10], &[4, 9]);
        assert_eq!(
            err.to_string(),
            "shape mismatch in Dense: expected [4, 10], got [4, 9]"
        );
    }

    #[test]
    fn test_label_lookup_message() {
        let err = CnnError::LabelLookup("Sphynx".to_string());
        assert_eq!(err.to_string(), "unknown label 'Sphynx'");
    }
}

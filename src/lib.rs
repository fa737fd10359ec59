//! Convolutional image classifier with hand-written backpropagation
//!
//! Every layer computes its own forward activation and backward gradient; there
//! is no automatic differentiation. The network is a fixed pipeline
//! Conv2D → ReLU → MaxPool2D → Dropout → Flatten → Dense trained with
//! full-batch gradient descent and a step-decayed learning rate.
//!
//! # Modules
//!
//! - `layers`: Layer trait and the six layer implementations
//! - `loss`: Softmax cross-entropy and its fused gradient
//! - `network`: The classifier orchestrating forward, backward, train and predict
//! - `labels`: Category vocabulary shared by training and prediction
//! - `dataset`: Labeled image batches and the synthetic data source
//! - `config`: JSON configuration for the network and the training run
//! - `tensor`: Shaped row-major f32 buffers
//! - `utils`: RNG and learning rate scheduling

pub mod config;
pub mod dataset;
pub mod error;
pub mod labels;
pub mod layers;
pub mod loss;
pub mod network;
pub mod tensor;
pub mod utils;

pub use error::{CnnError, CnnResult};
pub use labels::ClassMap;
pub use network::{CatClassifier, EpochReport, TrainingHistory};
pub use tensor::Tensor;

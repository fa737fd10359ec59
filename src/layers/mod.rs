//! Layer abstractions for the classifier
//!
//! This module provides the Layer trait and the six layer types the network is
//! assembled from.

mod r#trait;
pub mod conv2d;
pub mod dense;
pub mod dropout;
pub mod flatten;
pub mod maxpool2d;
pub mod relu;

pub use r#trait::Layer;
pub use conv2d::Conv2D;
pub use dense::Dense;
pub use dropout::{Dropout, Mode};
pub use flatten::Flatten;
pub use maxpool2d::MaxPool2D;
pub use relu::ReLU;

//! Shared utilities
//!
//! Deterministic random number generation and learning-rate scheduling.

pub mod lr_scheduler;
pub mod rng;

pub use lr_scheduler::{LRScheduler, StepDecay};
pub use rng::SimpleRng;

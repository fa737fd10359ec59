//! Learning rate scheduler trait and the step-decay schedule used for training
//!
//! The classifier decays its learning rate stepwise every `step_size` epochs and
//! never lets it drop below a floor.

/// Core trait for learning rate schedulers.
///
/// Schedulers adjust the learning rate during training based on the current epoch.
///
/// # Example
///
/// ```
/// use catnn::utils::lr_scheduler::{LRScheduler, StepDecay};
///
/// let mut scheduler = StepDecay::new(0.02, 10, 0.5, 0.005);
/// for _epoch in 0..=30 {
///     let _lr = scheduler.get_lr();
///     // ... forward / backward with `_lr` ...
///     scheduler.step();
/// }
/// scheduler.reset();
/// assert_eq!(scheduler.get_lr(), 0.02);
/// ```
pub trait LRScheduler {
    /// Learning rate for the current epoch.
    fn get_lr(&self) -> f32;

    /// Advance the scheduler to the next epoch.
    ///
    /// Call once per epoch, after the parameter update.
    fn step(&mut self);

    /// Reset the scheduler to epoch 0.
    fn reset(&mut self);
}

/// Step decay learning rate scheduler with a lower bound.
///
/// Formula: lr = max(initial_lr * gamma^(epoch / step_size), min_lr)
///
/// # Fields
///
/// * `initial_lr` - Starting learning rate
/// * `step_size` - Number of epochs between each decay step
/// * `gamma` - Multiplicative factor for decay
/// * `min_lr` - Floor the rate never drops below
/// * `current_epoch` - Current training epoch (0-indexed)
/// * `current_lr` - Current learning rate value
#[derive(Debug, Clone)]
pub struct StepDecay {
    initial_lr: f32,
    step_size: usize,
    gamma: f32,
    min_lr: f32,
    current_epoch: usize,
    current_lr: f32,
}

impl StepDecay {
    /// Creates a new step decay scheduler.
    ///
    /// `step_size` must be non-zero; the classifier's config validation
    /// guarantees this before a scheduler is built.
    pub fn new(initial_lr: f32, step_size: usize, gamma: f32, min_lr: f32) -> Self {
        let mut scheduler = Self {
            initial_lr,
            step_size: step_size.max(1),
            gamma,
            min_lr,
            current_epoch: 0,
            current_lr: initial_lr,
        };
        scheduler.current_lr = scheduler.lr_at(0);
        scheduler
    }

    /// Learning rate at an arbitrary epoch, independent of the internal counter.
    pub fn lr_at(&self, epoch: usize) -> f32 {
        let num_decays = (epoch / self.step_size) as i32;
        (self.initial_lr * self.gamma.powi(num_decays)).max(self.min_lr)
    }

    pub fn current_epoch(&self) -> usize {
        self.current_epoch
    }
}

impl LRScheduler for StepDecay {
    fn get_lr(&self) -> f32 {
        self.current_lr
    }

    fn step(&mut self) {
        self.current_epoch += 1;
        self.current_lr = self.lr_at(self.current_epoch);
    }

    fn reset(&mut self) {
        self.current_epoch = 0;
        self.current_lr = self.lr_at(0);
    }
}

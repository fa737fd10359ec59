//! Labeled image batches and where they come from
//!
//! Decoding, resizing and directory layout live outside this crate. A source
//! only has to hand over a normalized `(N, H, W, C)` tensor and N label strings
//! for the training and the held-out partition.

use crate::error::{CnnError, CnnResult};
use crate::tensor::Tensor;
use crate::utils::SimpleRng;

/// A batch of images with one label per sample.
#[derive(Debug, Clone)]
pub struct LabeledImages {
    pub images: Tensor,
    pub labels: Vec<String>,
}

impl LabeledImages {
    /// Pair images with labels, checking that the counts agree.
    pub fn new(images: Tensor, labels: Vec<String>) -> CnnResult<Self> {
        let (n, _, _, _) = images.dims4("LabeledImages")?;
        if n != labels.len() {
            return Err(CnnError::shape("LabeledImages", &[n], &[labels.len()]));
        }
        Ok(Self { images, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Provider of the training and held-out partitions.
pub trait DatasetSource {
    fn train_split(&self) -> CnnResult<LabeledImages>;
    fn test_split(&self) -> CnnResult<LabeledImages>;
}

/// Synthetic data: every image of a class is one flat colour plus a little
/// uniform noise, clamped to [0, 1].
///
/// Colours are assigned per class from a fixed palette, so any class count up
/// to the palette size is trivially separable.
#[derive(Debug, Clone)]
pub struct SyntheticColorDataset {
    class_names: Vec<String>,
    height: usize,
    width: usize,
    train_per_class: usize,
    test_per_class: usize,
    noise: f32,
    seed: u64,
}

const PALETTE: [[f32; 3]; 8] = [
    [0.9, 0.1, 0.1],
    [0.1, 0.9, 0.1],
    [0.1, 0.1, 0.9],
    [0.9, 0.9, 0.1],
    [0.1, 0.9, 0.9],
    [0.9, 0.1, 0.9],
    [0.9, 0.5, 0.1],
    [0.5, 0.5, 0.5],
];

impl SyntheticColorDataset {
    /// Images are always RGB.
    pub const CHANNELS: usize = 3;

    /// # Errors
    ///
    /// `CnnError::Configuration` for more classes than palette colours or a
    /// zero-sized image.
    pub fn new<S: AsRef<str>>(
        class_names: &[S],
        height: usize,
        width: usize,
        train_per_class: usize,
        test_per_class: usize,
        seed: u64,
    ) -> CnnResult<Self> {
        if class_names.is_empty() || class_names.len() > PALETTE.len() {
            return Err(CnnError::Configuration(format!(
                "synthetic dataset supports 1..={} classes, got {}",
                PALETTE.len(),
                class_names.len()
            )));
        }
        if height == 0 || width == 0 {
            return Err(CnnError::Configuration(
                "synthetic images need positive dimensions".to_string(),
            ));
        }
        Ok(Self {
            class_names: class_names.iter().map(|s| s.as_ref().to_string()).collect(),
            height,
            width,
            train_per_class,
            test_per_class,
            noise: 0.05,
            seed,
        })
    }

    /// Amplitude of the uniform noise added to each pixel (default 0.05).
    pub fn with_noise(mut self, noise: f32) -> Self {
        self.noise = noise;
        self
    }

    fn generate(&self, per_class: usize, seed: u64) -> CnnResult<LabeledImages> {
        let mut rng = SimpleRng::new(seed);
        let pixels = self.height * self.width;
        let n = per_class * self.class_names.len();
        let mut data = Vec::with_capacity(n * pixels * Self::CHANNELS);
        let mut labels = Vec::with_capacity(n);

        // interleave classes so any prefix of the batch is balanced
        for _ in 0..per_class {
            for (class, name) in self.class_names.iter().enumerate() {
                let colour = PALETTE[class];
                for _ in 0..pixels {
                    for &c in &colour {
                        let v = c + rng.gen_range_f32(-self.noise, self.noise);
                        data.push(v.clamp(0.0, 1.0));
                    }
                }
                labels.push(name.clone());
            }
        }

        let images = Tensor::new(vec![n, self.height, self.width, Self::CHANNELS], data)?;
        LabeledImages::new(images, labels)
    }
}

impl DatasetSource for SyntheticColorDataset {
    fn train_split(&self) -> CnnResult<LabeledImages> {
        self.generate(self.train_per_class, self.seed)
    }

    fn test_split(&self) -> CnnResult<LabeledImages> {
        self.generate(self.test_per_class, self.seed.wrapping_add(1))
    }
}

//! The image classifier: a fixed Conv2D → ReLU → MaxPool2D → (Dropout) →
//! Flatten → Dense pipeline trained with full-batch gradient descent.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::{NetworkConfig, TrainingConfig};
use crate::error::{CnnError, CnnResult};
use crate::labels::ClassMap;
use crate::layers::{Conv2D, Dense, Dropout, Flatten, Layer, MaxPool2D, Mode, ReLU};
use crate::loss::{accuracy, argmax_rows, cross_entropy_loss, softmax_cross_entropy_grad};
use crate::tensor::Tensor;
use crate::utils::{LRScheduler, SimpleRng, StepDecay};

/// Loss, accuracy and learning rate recorded for one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    pub epoch: usize,
    pub loss: f32,
    pub accuracy: f32,
    pub learning_rate: f32,
}

/// Per-epoch reports of a training run, in epoch order.
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochReport>,
}

impl TrainingHistory {
    pub fn losses(&self) -> Vec<f32> {
        self.epochs.iter().map(|r| r.loss).collect()
    }

    pub fn last(&self) -> Option<&EpochReport> {
        self.epochs.last()
    }
}

/// Convolutional classifier over a fixed category vocabulary.
///
/// Owns one instance of each layer. Data moves between layers by value; each
/// layer keeps only its own backward cache.
#[derive(Debug)]
pub struct CatClassifier {
    conv: Conv2D,
    relu: ReLU,
    pool: MaxPool2D,
    dropout: Dropout,
    flatten: Flatten,
    dense: Dense,
    class_map: ClassMap,
    route_dropout: bool,
}

impl CatClassifier {
    /// Build the pipeline for `config`, with one logit per entry of `class_map`.
    ///
    /// # Errors
    ///
    /// `CnnError::Configuration` if any layer rejects its parameters, e.g. a
    /// kernel larger than the input or a pooling window larger than the
    /// convolution output.
    pub fn new(config: &NetworkConfig, class_map: ClassMap) -> CnnResult<Self> {
        config.validate()?;
        let mut rng = SimpleRng::new(config.seed);

        let conv = Conv2D::new(
            config.in_channels,
            config.conv_out_channels,
            config.kernel_size,
            config.input_height,
            config.input_width,
            &mut rng,
        )?;
        let pool = MaxPool2D::new(config.pool_size, config.pool_stride)?;
        let (conv_h, conv_w) = (conv.output_height(), conv.output_width());
        let (Some(pool_h), Some(pool_w)) = (pool.output_len(conv_h), pool.output_len(conv_w))
        else {
            return Err(CnnError::Configuration(format!(
                "pooling window {} does not fit the {}x{} convolution output",
                pool.size(),
                conv_h,
                conv_w
            )));
        };
        let pooled = pool_h * pool_w;
        let dense_in = pooled * config.conv_out_channels;
        let dropout = Dropout::new(config.dropout_rate, rng.fork())?;
        let dense = Dense::new(dense_in, class_map.len(), &mut rng)?;

        debug!(
            conv_params = conv.parameter_count(),
            dense_params = dense.parameter_count(),
            dense_in,
            classes = class_map.len(),
            route_dropout = config.route_dropout,
            "built classifier"
        );

        Ok(Self {
            conv,
            relu: ReLU::new(),
            pool,
            dropout,
            flatten: Flatten::new(),
            dense,
            class_map,
            route_dropout: config.route_dropout,
        })
    }

    pub fn class_map(&self) -> &ClassMap {
        &self.class_map
    }

    pub fn conv(&self) -> &Conv2D {
        &self.conv
    }

    pub fn dense(&self) -> &Dense {
        &self.dense
    }

    pub fn dropout(&self) -> &Dropout {
        &self.dropout
    }

    pub fn routes_dropout(&self) -> bool {
        self.route_dropout
    }

    pub fn parameter_count(&self) -> usize {
        self.conv.parameter_count() + self.dense.parameter_count()
    }

    /// Forward pass of the whole pipeline, returning `(N, num_classes)` logits.
    pub fn forward(&mut self, images: &Tensor) -> CnnResult<Tensor> {
        let x = self.conv.forward(images)?;
        let x = self.relu.forward(&x)?;
        let mut x = self.pool.forward(&x)?;
        if self.route_dropout {
            x = self.dropout.forward(&x)?;
        }
        let x = self.flatten.forward(&x)?;
        self.dense.forward(&x)
    }

    /// Backward pass from the gradient at the logits. Updates Dense and Conv2D
    /// parameters in place with `learning_rate`.
    pub fn backward(&mut self, grad_logits: &Tensor, learning_rate: f32) -> CnnResult<()> {
        let g = self.dense.backward(grad_logits, learning_rate)?;
        let mut g = self.flatten.backward(&g, learning_rate)?;
        if self.route_dropout {
            g = self.dropout.backward(&g, learning_rate)?;
        }
        let g = self.pool.backward(&g, learning_rate)?;
        let g = self.relu.backward(&g, learning_rate)?;
        self.conv.backward(&g, learning_rate)?;
        Ok(())
    }

    /// Full-batch training for `config.epochs + 1` iterations.
    ///
    /// Each epoch: forward, softmax cross-entropy, fused gradient `(P - Y) / N`,
    /// backward with the decayed learning rate. Progress is logged every
    /// `config.log_every` epochs.
    ///
    /// # Errors
    ///
    /// `CnnError::LabelLookup` for a label outside the vocabulary,
    /// `CnnError::ShapeMismatch` if the label count differs from the batch
    /// size or the images do not fit the network. Labels and config are
    /// checked before any parameter changes.
    pub fn train<S: AsRef<str>>(
        &mut self,
        images: &Tensor,
        labels: &[S],
        config: &TrainingConfig,
    ) -> CnnResult<TrainingHistory> {
        config.validate()?;
        let n = images.batch_size();
        if n != labels.len() {
            return Err(CnnError::shape("train", &[n], &[labels.len()]));
        }
        let label_indices = self.class_map.encode(labels)?;
        let mut loss_log = open_loss_log(config.loss_log_path.as_deref())?;

        let mut scheduler = StepDecay::new(
            config.learning_rate,
            config.decay_step,
            config.decay_rate,
            config.min_lr,
        );
        let mut history = TrainingHistory::default();
        let start = Instant::now();

        info!(
            samples = n,
            epochs = config.epochs,
            parameters = self.parameter_count(),
            "starting training"
        );
        self.dropout.set_mode(Mode::Training);

        for epoch in 0..=config.epochs {
            let lr = scheduler.get_lr();
            let logits = self.forward(images)?;

            let one_hot = self.class_map.one_hot(&label_indices)?;
            let (loss, probs) = cross_entropy_loss(&one_hot, &logits)?;
            let grad = softmax_cross_entropy_grad(&probs, &one_hot)?;
            self.backward(&grad, lr)?;

            let acc = accuracy(&probs, &label_indices)?;
            let report = EpochReport {
                epoch,
                loss,
                accuracy: acc,
                learning_rate: lr,
            };
            history.epochs.push(report);

            if epoch % config.log_every == 0 {
                info!(
                    "[ TRAINING ] Epoch {} -> Loss: {:.4} | Acc: {:.4} | LR: {:.5}",
                    epoch, loss, acc, lr
                );
            }
            if let Some(log) = loss_log.as_mut() {
                writeln!(log, "{},{},{},{}", epoch, loss, acc, lr)?;
            }

            scheduler.step();
        }

        if let Some(mut log) = loss_log {
            log.flush()?;
        }
        info!(
            elapsed_secs = start.elapsed().as_secs_f32(),
            "training finished"
        );
        Ok(history)
    }

    /// Predict a category name for every image. Switches dropout to evaluation.
    pub fn predict(&mut self, images: &Tensor) -> CnnResult<Vec<String>> {
        self.dropout.set_mode(Mode::Evaluation);
        let logits = self.forward(images)?;
        argmax_rows(&logits)?
            .into_iter()
            .map(|idx| {
                self.class_map
                    .name_of(idx)
                    .map(str::to_string)
                    .ok_or_else(|| CnnError::LabelLookup(format!("index {}", idx)))
            })
            .collect()
    }

    /// Percentage of images whose predicted name equals the given label.
    pub fn evaluate<S: AsRef<str>>(&mut self, images: &Tensor, labels: &[S]) -> CnnResult<f32> {
        let predictions = self.predict(images)?;
        if predictions.len() != labels.len() {
            return Err(CnnError::shape(
                "evaluate",
                &[predictions.len()],
                &[labels.len()],
            ));
        }
        if labels.is_empty() {
            return Ok(0.0);
        }
        let correct = predictions
            .iter()
            .zip(labels)
            .filter(|(p, l)| p.as_str() == AsRef::<str>::as_ref(*l))
            .count();
        Ok(100.0 * correct as f32 / labels.len() as f32)
    }
}

fn open_loss_log(path: Option<&str>) -> CnnResult<Option<BufWriter<File>>> {
    let Some(path) = path else {
        return Ok(None);
    };
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "epoch,loss,accuracy,lr")?;
    Ok(Some(writer))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> NetworkConfig {
        NetworkConfig {
            input_height: 6,
            input_width: 6,
            in_channels: 3,
            conv_out_channels: 2,
            kernel_size: 3,
            pool_size: 2,
            pool_stride: 2,
            ..NetworkConfig::default()
        }
    }

    #[test]
    fn test_dense_width_follows_geometry() {
        let net = CatClassifier::new(&small_config(), ClassMap::cat_breeds()).unwrap();
        // 6x6 -> conv 4x4 -> pool 2x2, 2 channels
        assert_eq!(net.dense().input_size(), 8);
        assert_eq!(net.dense().output_size(), 5);
        assert_eq!(net.parameter_count(), (54 + 2) + (8 * 5 + 5));
    }

    #[test]
    fn test_reference_geometry() {
        let net = CatClassifier::new(&NetworkConfig::default(), ClassMap::cat_breeds()).unwrap();
        assert_eq!(net.dense().input_size(), 16 * 59 * 59);
    }

    #[test]
    fn test_pool_larger_than_conv_output() {
        let mut cfg = small_config();
        cfg.pool_size = 5;
        assert!(matches!(
            CatClassifier::new(&cfg, ClassMap::cat_breeds()),
            Err(CnnError::Configuration(_))
        ));
    }

    #[test]
    fn test_label_count_mismatch_leaves_parameters() {
        let mut net = CatClassifier::new(&small_config(), ClassMap::cat_breeds()).unwrap();
        let before = net.dense().weights().to_vec();
        let images = Tensor::zeros(vec![2, 6, 6, 3]);
        let result = net.train(&images, &["Bengal"], &TrainingConfig::default());
        assert!(matches!(result, Err(CnnError::ShapeMismatch { .. })));
        assert_eq!(net.dense().weights(), before.as_slice());
    }
}

//! Configuration structures for the network and the training run
//!
//! Both halves can be parsed from a JSON file. Every field has a default, so a
//! file only needs to list the values it changes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{CnnError, CnnResult};

/// Geometry and hyperparameters of the fixed Conv → ReLU → Pool → Dropout →
/// Flatten → Dense pipeline.
///
/// # Example
///
/// ```json
/// {
///   "input_height": 120,
///   "input_width": 120,
///   "conv_out_channels": 16,
///   "kernel_size": 3,
///   "dropout_rate": 0.25
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub input_height: usize,
    pub input_width: usize,
    pub in_channels: usize,
    pub conv_out_channels: usize,
    pub kernel_size: usize,
    pub pool_size: usize,
    pub pool_stride: usize,
    /// Probability of dropping a unit in training mode.
    pub dropout_rate: f32,
    /// Send activations through the dropout layer. Off by default: the
    /// classifier toggles the layer's mode but skips it in the data path.
    pub route_dropout: bool,
    /// Seed for weight initialisation and dropout masks.
    pub seed: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            input_height: 120,
            input_width: 120,
            in_channels: 3,
            conv_out_channels: 16,
            kernel_size: 3,
            pool_size: 2,
            pool_stride: 2,
            dropout_rate: 0.25,
            route_dropout: false,
            seed: 42,
        }
    }
}

/// Learning-rate schedule and reporting for one training run.
///
/// The rate at epoch `e` is
/// `max(learning_rate * decay_rate^(e / decay_step), min_lr)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Last epoch index; training runs `epochs + 1` iterations.
    pub epochs: usize,
    pub learning_rate: f32,
    pub decay_rate: f32,
    pub decay_step: usize,
    pub min_lr: f32,
    /// Report progress every `log_every` epochs.
    pub log_every: usize,
    /// Optional CSV file receiving `epoch,loss,accuracy,lr` per epoch.
    pub loss_log_path: Option<String>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            learning_rate: 0.02,
            decay_rate: 0.5,
            decay_step: 10,
            min_lr: 0.005,
            log_every: 1,
            loss_log_path: None,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub training: TrainingConfig,
}

impl NetworkConfig {
    /// Check the values a layer constructor cannot check on its own.
    pub fn validate(&self) -> CnnResult<()> {
        if self.input_height == 0 || self.input_width == 0 {
            return Err(CnnError::Configuration(
                "input dimensions must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err(CnnError::Configuration(format!(
                "dropout_rate must be in range [0.0, 1.0), got {}",
                self.dropout_rate
            )));
        }
        Ok(())
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> CnnResult<()> {
        if !(self.learning_rate > 0.0) {
            return Err(CnnError::Configuration(
                "learning_rate must be positive".to_string(),
            ));
        }
        if !(self.decay_rate >= 0.0) {
            return Err(CnnError::Configuration(
                "decay_rate must be non-negative".to_string(),
            ));
        }
        if self.decay_step == 0 {
            return Err(CnnError::Configuration(
                "decay_step must be at least 1".to_string(),
            ));
        }
        if !(self.min_lr >= 0.0) {
            return Err(CnnError::Configuration(
                "min_lr must be non-negative".to_string(),
            ));
        }
        if self.log_every == 0 {
            return Err(CnnError::Configuration(
                "log_every must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn validate(&self) -> CnnResult<()> {
        self.network.validate()?;
        self.training.validate()
    }
}

/// Loads and validates a configuration from a JSON file.
///
/// # Examples
///
/// ```no_run
/// use catnn::config::load_config;
///
/// let cfg = load_config("config/catnn_default.json").unwrap();
/// assert_eq!(cfg.training.epochs, 100);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> CnnResult<Config> {
    let contents = fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_run() {
        let cfg = Config::default();
        assert_eq!(cfg.training.epochs, 100);
        assert_eq!(cfg.training.learning_rate, 0.02);
        assert_eq!(cfg.training.decay_rate, 0.5);
        assert_eq!(cfg.training.decay_step, 10);
        assert_eq!(cfg.training.min_lr, 0.005);
        assert_eq!(cfg.network.conv_out_channels, 16);
        assert!(!cfg.network.route_dropout);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"training": {"epochs": 5}}"#).unwrap();
        assert_eq!(cfg.training.epochs, 5);
        assert_eq!(cfg.training.decay_step, 10);
        assert_eq!(cfg.network, NetworkConfig::default());
    }

    #[test]
    fn test_zero_decay_step_rejected() {
        let mut cfg = TrainingConfig::default();
        cfg.decay_step = 0;
        assert!(matches!(cfg.validate(), Err(CnnError::Configuration(_))));
    }

    #[test]
    fn test_dropout_rate_one_rejected() {
        let mut cfg = NetworkConfig::default();
        cfg.dropout_rate = 1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_nan_schedule_values_rejected() {
        for cfg in [
            TrainingConfig {
                decay_rate: f32::NAN,
                ..TrainingConfig::default()
            },
            TrainingConfig {
                min_lr: f32::NAN,
                ..TrainingConfig::default()
            },
            TrainingConfig {
                learning_rate: f32::NAN,
                ..TrainingConfig::default()
            },
        ] {
            assert!(matches!(cfg.validate(), Err(CnnError::Configuration(_))));
        }
    }
}

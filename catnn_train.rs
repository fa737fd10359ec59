// catnn_train.rs
// Train the cat-breed classifier end to end on synthetic colour images.
//
// Usage:
//   catnn_train [config.json]
//
// Without a config file the reference hyperparameters are used (120x120x3
// input, 100 epochs), which is slow on CPU; config/catnn_synthetic.json is a
// smaller setup that finishes in seconds.
//
// Output:
//   - progress via tracing (RUST_LOG controls the level, default info)
//   - optional CSV loss log when `training.loss_log_path` is set
//   - prints test accuracy

use std::env;
use std::process;

use catnn::config::{load_config, Config};
use catnn::dataset::{DatasetSource, SyntheticColorDataset};
use catnn::{CatClassifier, ClassMap, CnnError, CnnResult};
use tracing_subscriber::EnvFilter;

const TRAIN_PER_CLASS: usize = 8;
const TEST_PER_CLASS: usize = 4;

fn config_from_args(args: &[String]) -> CnnResult<Config> {
    match args.get(1) {
        Some(path) => load_config(path),
        None => Ok(Config::default()),
    }
}

fn run(args: &[String]) -> CnnResult<f32> {
    let config = config_from_args(args)?;
    if config.network.in_channels != SyntheticColorDataset::CHANNELS {
        return Err(CnnError::Configuration(format!(
            "synthetic dataset produces {}-channel images, network expects {}",
            SyntheticColorDataset::CHANNELS,
            config.network.in_channels
        )));
    }
    let class_map = ClassMap::cat_breeds();

    let dataset = SyntheticColorDataset::new(
        class_map.names(),
        config.network.input_height,
        config.network.input_width,
        TRAIN_PER_CLASS,
        TEST_PER_CLASS,
        config.network.seed,
    )?;
    let train = dataset.train_split()?;
    let test = dataset.test_split()?;
    tracing::info!(train = train.len(), test = test.len(), "loaded dataset");

    let mut model = CatClassifier::new(&config.network, class_map)?;
    model.train(&train.images, &train.labels, &config.training)?;
    model.evaluate(&test.images, &test.labels)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    match run(&args) {
        Ok(accuracy) => println!("[ ACCURACY ] {:.4}%", accuracy),
        Err(err) => {
            eprintln!("error: {}", err);
            process::exit(1);
        }
    }
}

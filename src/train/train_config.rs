use std::fs;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::data::dataset::DataConfig;
use crate::error::{Error, Result};
use crate::network::config::ResNetConfig;
use crate::optim::plateau::PlateauConfig;
use crate::optim::OptimizerKind;

/// Every knob of a training experiment.
///
/// # Fields
/// - `run_name`      - prefix of each repetition's log directory
/// - `log_dir`       - parent directory of the run directories
/// - `runs`          - independent repetitions, each with fresh weights and split
/// - `seed`          - base seed; repetition `n` uses `seed + n`
/// - `epochs`        - fixed epoch budget per repetition
/// - `batch_size`    - segments per mini-batch (train and test)
/// - `log_every`     - `Acc/train` is logged when `batch_idx % log_every == 0`
/// - `shuffle`       - reshuffle training segments every epoch
/// - `optimizer`     - `adam` or `sgd`
/// - `learning_rate` - initial learning rate
/// - `weight_decay`  - L2 penalty folded into the gradients
/// - `plateau`       - learning-rate reduction on a validation-loss plateau
/// - `data`          - windowing and split options
/// - `model`         - scorer hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub run_name: String,
    pub log_dir: PathBuf,
    pub runs: usize,
    pub seed: u64,
    pub epochs: usize,
    pub batch_size: usize,
    pub log_every: usize,
    pub shuffle: bool,
    pub optimizer: OptimizerKind,
    pub learning_rate: f64,
    pub weight_decay: f64,
    pub plateau: PlateauConfig,
    pub data: DataConfig,
    pub model: ResNetConfig,
}

impl ExperimentConfig {
    /// 48-block residual network, 100 epochs, three repetitions.
    pub fn resnet1d() -> ExperimentConfig {
        ExperimentConfig {
            run_name: "test_physionet".into(),
            log_dir: PathBuf::from("runs/challenge2017"),
            runs: 3,
            seed: 0,
            epochs: 100,
            batch_size: 32,
            log_every: 100,
            shuffle: true,
            optimizer: OptimizerKind::Adam,
            learning_rate: 1e-3,
            weight_decay: 1e-3,
            plateau: PlateauConfig::default(),
            data: DataConfig::default(),
            model: ResNetConfig {
                in_channels: 1,
                base_filters: 128,
                kernel_size: 16,
                stride: 2,
                n_block: 48,
                n_classes: 4,
                downsample_gap: 6,
                increasefilter_gap: 12,
                use_dropout: true,
                dropout: 0.5,
                activation: ActivationFunction::ReLU,
            },
        }
    }

    /// Narrower, shallower network with Swish activations, 50 epochs, one run.
    pub fn net1d() -> ExperimentConfig {
        let base = ExperimentConfig::resnet1d();
        ExperimentConfig {
            run_name: "net1d".into(),
            runs: 1,
            epochs: 50,
            model: ResNetConfig {
                base_filters: 64,
                n_block: 20,
                downsample_gap: 3,
                increasefilter_gap: 6,
                use_dropout: false,
                activation: ActivationFunction::Swish,
                ..base.model.clone()
            },
            ..base
        }
    }

    /// Sets the class count of both the data and the scorer.
    pub fn with_classes(mut self, n_classes: usize) -> ExperimentConfig {
        self.data.n_classes = n_classes;
        self.model.n_classes = n_classes;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("runs", self.runs),
            ("epochs", self.epochs),
            ("batch_size", self.batch_size),
            ("log_every", self.log_every),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{name} must be at least 1")));
            }
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.weight_decay < 0.0 {
            return Err(Error::InvalidConfig("weight_decay must not be negative".into()));
        }
        if !(self.plateau.factor > 0.0 && self.plateau.factor < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "plateau factor must lie in (0, 1), got {}",
                self.plateau.factor
            )));
        }
        if self.data.n_classes != self.model.n_classes {
            return Err(Error::InvalidConfig(format!(
                "data has {} classes but the model scores {}",
                self.data.n_classes, self.model.n_classes
            )));
        }
        self.data.validate()?;
        self.model.validate()
    }

    /// Log directory of repetition `run`.
    pub fn run_dir(&self, run: usize) -> PathBuf {
        self.log_dir.join(format!("{}_cv{run}", self.run_name))
    }

    pub fn run_seed(&self, run: usize) -> u64 {
        self.seed.wrapping_add(run as u64)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<ExperimentConfig> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig::resnet1d()
    }
}

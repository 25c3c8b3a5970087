use std::path::PathBuf;

use log::info;

use crate::data::dataset::{DataProvider, Split};
use crate::error::Result;
use crate::network::checkpoint::SavedModel;
use crate::network::metadata::ModelMetadata;
use crate::network::resnet1d::ResNet1d;
use crate::network::scorer::Scorer;
use crate::summary::{JsonlSummaryWriter, ScalarSink};
use crate::train::epoch_stats::EpochStats;
use crate::train::loop_fn::train_loop;
use crate::train::train_config::ExperimentConfig;

/// File name of the saved weights inside a run directory.
pub const MODEL_FILE: &str = "model.json";

/// Outcome of one repetition.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run: usize,
    pub run_dir: PathBuf,
    pub history: Vec<EpochStats>,
    /// Where the trained weights were written, when requested.
    pub model_path: Option<PathBuf>,
}

impl RunReport {
    pub fn final_macro_f1(&self) -> Option<f64> {
        self.history.last().map(|s| s.macro_f1)
    }
}

/// Trains a freshly initialised scorer on `split` and returns it together
/// with its per-epoch statistics.
pub fn train_run(
    config: &ExperimentConfig,
    split: &Split,
    seed: u64,
    sink: &mut dyn ScalarSink,
) -> Result<(ResNet1d, Vec<EpochStats>)> {
    let mut network = ResNet1d::new(config.model.clone(), seed);
    info!("{}", network.summary());
    let mut optimizer = config.optimizer.build(config.learning_rate, config.weight_decay);

    let history = train_loop(&mut network, optimizer.as_mut(), split, config, seed, sink)?;
    Ok((network, history))
}

/// Runs `config.runs` independent repetitions. Repetition `n` reloads the
/// data with seed `seed + n`, logs scalars to `<log_dir>/<run_name>_cv{n}`
/// and optionally saves its weights there.
pub fn run_experiment(
    config: &ExperimentConfig,
    provider: &dyn DataProvider,
    save_model: bool,
) -> Result<Vec<RunReport>> {
    config.validate()?;
    let mut reports = Vec::with_capacity(config.runs);

    for run in 0..config.runs {
        let seed = config.run_seed(run);
        let run_dir = config.run_dir(run);
        info!("run {}/{} (seed {seed}) -> {}", run + 1, config.runs, run_dir.display());

        let split = provider.load(seed)?;
        let mut writer = JsonlSummaryWriter::create(&run_dir)?;
        let (network, history) = train_run(config, &split, seed, &mut writer)?;
        writer.flush()?;

        let model_path = if save_model {
            let path = run_dir.join(MODEL_FILE);
            let metadata = ModelMetadata {
                description: Some(format!("{} repetition {run}", config.run_name)),
                class_names: Some(config.data.class_names()),
                epochs: Some(history.len()),
                final_macro_f1: history.last().map(|s| s.macro_f1),
            };
            SavedModel::from_network(&network, Some(metadata)).save_json(&path)?;
            info!("saved {} parameters to {}", network.param_count(), path.display());
            Some(path)
        } else {
            None
        };

        reports.push(RunReport { run, run_dir, history, model_path });
    }

    Ok(reports)
}

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use ferrite_ecg::data::{CsvRecordProvider, DataProvider, SyntheticProvider};
use ferrite_ecg::train::{run_experiment, ExperimentConfig};

/// Trains residual 1-D conv nets on single-lead ECG segments and scores them
/// per patient by majority vote.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the training experiment.
    Train(TrainArgs),
    /// Print the resolved experiment configuration as JSON.
    PrintConfig(ConfigArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Preset {
    Resnet1d,
    Net1d,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Built-in configuration to start from.
    #[arg(long, value_enum, default_value_t = Preset::Resnet1d)]
    preset: Preset,
    /// Full experiment configuration as JSON; replaces the preset.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    epochs: Option<usize>,
    #[arg(long)]
    batch_size: Option<usize>,
    /// Independent repetitions, each with its own log directory.
    #[arg(long)]
    runs: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// 4 for Normal/AF/Other/Noisy, 2 for Normal vs AF.
    #[arg(long, value_parser = clap::value_parser!(u8).range(2..=4))]
    classes: Option<u8>,
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TrainArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// CSV of whole records: `pid,label,v1,...,vn`.
    #[arg(long, conflicts_with = "synthetic", required_unless_present = "synthetic")]
    data: Option<PathBuf>,
    /// Train on generated waveforms instead of a CSV.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
    /// Generated patients per class with `--synthetic`.
    #[arg(long, default_value_t = 40)]
    synthetic_patients: usize,
    /// Samples per generated record with `--synthetic`.
    #[arg(long, default_value_t = 9000)]
    synthetic_len: usize,
    /// Write the trained weights to `<run_dir>/model.json`.
    #[arg(long, default_value_t = false)]
    save_model: bool,
}

impl ConfigArgs {
    fn resolve(&self) -> anyhow::Result<ExperimentConfig> {
        let mut cfg = match &self.config {
            Some(path) => ExperimentConfig::load_json(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => match self.preset {
                Preset::Resnet1d => ExperimentConfig::resnet1d(),
                Preset::Net1d => ExperimentConfig::net1d(),
            },
        };

        if let Some(v) = self.epochs {
            cfg.epochs = v;
        }
        if let Some(v) = self.batch_size {
            cfg.batch_size = v;
        }
        if let Some(v) = self.runs {
            cfg.runs = v;
        }
        if let Some(v) = self.seed {
            cfg.seed = v;
        }
        if let Some(v) = self.classes {
            cfg = cfg.with_classes(v as usize);
        }
        if let Some(v) = &self.log_dir {
            cfg.log_dir = v.clone();
        }

        cfg.validate().context("invalid experiment configuration")?;
        Ok(cfg)
    }
}

fn train(args: TrainArgs) -> anyhow::Result<()> {
    let cfg = args.config.resolve()?;

    let provider: Box<dyn DataProvider> = match (&args.data, args.synthetic) {
        (Some(path), _) => Box::new(CsvRecordProvider::new(path, cfg.data.clone())),
        (None, true) => Box::new(SyntheticProvider::new(
            args.synthetic_patients,
            args.synthetic_len,
            cfg.data.clone(),
            cfg.seed,
        )),
        (None, false) => bail!("either --data or --synthetic is required"),
    };

    let reports = run_experiment(&cfg, provider.as_ref(), args.save_model)
        .context("training failed")?;

    for report in &reports {
        info!(
            "run {}: final macro F1 {:.4} (logs in {})",
            report.run,
            report.final_macro_f1().unwrap_or(0.0),
            report.run_dir.display()
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Train(args) => train(args),
        Command::PrintConfig(args) => {
            let cfg = args.resolve()?;
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            Ok(())
        }
    }
}

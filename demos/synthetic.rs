use ferrite_ecg::activation::ActivationFunction;
use ferrite_ecg::data::{DataConfig, DataProvider, SyntheticProvider};
use ferrite_ecg::summary::MemorySink;
use ferrite_ecg::train::{train_run, ExperimentConfig};
use ferrite_ecg::ResNetConfig;

fn main() -> ferrite_ecg::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut config = ExperimentConfig::resnet1d();
    config.epochs = 8;
    config.batch_size = 16;
    config.data = DataConfig {
        n_classes: 4,
        window: 200,
        train_stride: 50,
        test_stride: 100,
        test_fraction: 0.25,
        standardize: true,
    };
    config.model = ResNetConfig {
        base_filters: 8,
        kernel_size: 7,
        n_block: 4,
        downsample_gap: 2,
        increasefilter_gap: 2,
        use_dropout: false,
        activation: ActivationFunction::ReLU,
        ..config.model
    };
    config.validate()?;

    let provider = SyntheticProvider::new(12, 600, config.data.clone(), 7);
    let split = provider.load(config.seed)?;
    println!(
        "{} train segments, {} test segments from {} test patients",
        split.train.len(),
        split.test.len(),
        split.test.n_patients()
    );

    let mut sink = MemorySink::new();
    let (_, history) = train_run(&config, &split, config.seed, &mut sink)?;
    for stats in &history {
        println!("{stats}");
    }
    if let Some(last) = history.last() {
        println!("per-class F1: {:?}", last.per_class_f1);
    }
    Ok(())
}

use ferrite_ecg::activation::ActivationFunction;
use ferrite_ecg::data::{DataConfig, SyntheticProvider};
use ferrite_ecg::network::SavedModel;
use ferrite_ecg::summary::writer::SCALARS_FILE;
use ferrite_ecg::summary::JsonlSummaryWriter;
use ferrite_ecg::train::experiment::MODEL_FILE;
use ferrite_ecg::train::{run_experiment, ExperimentConfig};
use ferrite_ecg::{ResNetConfig, Scorer};

fn tiny_config(log_dir: &std::path::Path) -> ExperimentConfig {
    let mut cfg = ExperimentConfig::resnet1d();
    cfg.run_name = "smoke".into();
    cfg.log_dir = log_dir.to_path_buf();
    cfg.runs = 2;
    cfg.epochs = 2;
    cfg.batch_size = 8;
    cfg.log_every = 3;
    cfg.data = DataConfig {
        n_classes: 4,
        window: 48,
        train_stride: 24,
        test_stride: 48,
        test_fraction: 0.25,
        standardize: true,
    };
    cfg.model = ResNetConfig {
        in_channels: 1,
        base_filters: 2,
        kernel_size: 5,
        stride: 2,
        n_block: 3,
        n_classes: 4,
        downsample_gap: 2,
        increasefilter_gap: 2,
        use_dropout: true,
        dropout: 0.2,
        activation: ActivationFunction::ReLU,
    };
    cfg
}

#[test]
fn synthetic_experiment_writes_logs_and_weights() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = tiny_config(dir.path());
    let provider = SyntheticProvider::new(3, 144, cfg.data.clone(), 1);

    let reports = run_experiment(&cfg, &provider, true).unwrap();
    assert_eq!(reports.len(), 2);

    for (n, report) in reports.iter().enumerate() {
        assert_eq!(report.run_dir, dir.path().join(format!("smoke_cv{n}")));
        assert_eq!(report.history.len(), 2);
        assert!(report
            .history
            .iter()
            .all(|s| s.train_loss.is_finite() && s.val_loss.is_finite()));
        let f1 = report.final_macro_f1().unwrap();
        assert!((0.0..=1.0).contains(&f1));

        let entries = JsonlSummaryWriter::read(report.run_dir.join(SCALARS_FILE)).unwrap();
        let tags: Vec<&str> = entries.iter().map(|e| e.tag.as_str()).collect();
        for tag in [
            "Loss/train",
            "Acc/train",
            "F1/f1_score",
            "F1/label_0",
            "F1/label_1",
            "F1/label_2",
            "F1/label_3",
            "LR",
        ] {
            assert!(tags.contains(&tag), "missing {tag} in run {n}");
        }
        let epoch_steps: Vec<usize> = entries
            .iter()
            .filter(|e| e.tag == "F1/f1_score")
            .map(|e| e.step)
            .collect();
        assert_eq!(epoch_steps, vec![0, 1]);

        let path = report.model_path.as_ref().unwrap();
        assert_eq!(path, &report.run_dir.join(MODEL_FILE));
        let saved = SavedModel::load_json(path).unwrap();
        let meta = saved.metadata.clone().unwrap();
        assert_eq!(meta.epochs, Some(2));
        assert_eq!(meta.final_macro_f1, Some(f1));
        let net = saved.into_network().unwrap();
        assert_eq!(net.n_classes(), 4);
    }
}

#[test]
fn invalid_config_fails_before_training() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = tiny_config(dir.path());
    cfg.batch_size = 0;
    let provider = SyntheticProvider::new(3, 144, cfg.data.clone(), 1);
    assert!(run_experiment(&cfg, &provider, false).is_err());
    assert!(!dir.path().join("smoke_cv0").exists());
}

pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod eval;
pub mod data;
pub mod summary;
pub mod train;

// Convenience re-exports
pub use error::{Error, Result};
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use network::{Mode, ResNet1d, ResNetConfig, SavedModel, Scorer};
pub use loss::cross_entropy::CrossEntropyLoss;
pub use optim::{Adam, Optimizer, OptimizerKind, PlateauConfig, ReduceLrOnPlateau, Sgd};
pub use eval::{evaluate, Evaluation};
pub use data::{CsvRecordProvider, DataConfig, DataProvider, SyntheticProvider};
pub use summary::{JsonlSummaryWriter, MemorySink, ScalarSink};
pub use train::{run_experiment, train_loop, EpochStats, ExperimentConfig};

pub mod epoch_stats;
pub mod experiment;
pub mod loop_fn;
pub mod step;
pub mod train_config;

pub use epoch_stats::EpochStats;
pub use experiment::{run_experiment, train_run, RunReport};
pub use loop_fn::{evaluate_scorer, train_loop};
pub use step::{train_step, StepCounter};
pub use train_config::ExperimentConfig;

pub mod pipeline;
pub mod report;
pub mod vote;

pub use pipeline::{evaluate, Evaluation};
pub use report::{ClassMetrics, ClassificationReport, ConfusionMatrix};
pub use vote::{argmax, group_by_patient, majority_vote, vote_by_patient, PatientVotes};

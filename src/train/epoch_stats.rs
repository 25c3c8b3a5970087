use std::fmt;

use serde::{Serialize, Deserialize};

/// Per-epoch statistics returned by `train_loop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 0-based epoch index, as used for the epoch-level scalars.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Mean training loss over all batches of this epoch.
    pub train_loss: f64,
    /// Mean cross-entropy over the test segments.
    pub val_loss: f64,
    /// Learning rate in effect during this epoch.
    pub learning_rate: f64,
    /// Patient-level macro F1 after this epoch.
    pub macro_f1: f64,
    pub per_class_f1: Vec<f64>,
    /// Patients that took part in the vote.
    pub n_patients: usize,
    /// Wall-clock duration of this epoch in milliseconds.
    pub elapsed_ms: u64,
}

impl fmt::Display for EpochStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "epoch {}/{}: train_loss={:.4} val_loss={:.4} macro_f1={:.4} lr={:.1e} ({} ms)",
            self.epoch + 1,
            self.total_epochs,
            self.train_loss,
            self.val_loss,
            self.macro_f1,
            self.learning_rate,
            self.elapsed_ms,
        )
    }
}

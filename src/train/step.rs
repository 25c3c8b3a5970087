use log::warn;

use crate::data::dataset::Batch;
use crate::error::Result;
use crate::eval::vote::argmax;
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::math::matrix::Matrix;
use crate::network::mode::Mode;
use crate::network::scorer::Scorer;
use crate::optim::Optimizer;
use crate::summary::ScalarSink;

/// Scalar tags written by the training step.
pub const LOSS_TRAIN: &str = "Loss/train";
pub const ACC_TRAIN: &str = "Acc/train";

/// Running position of the training step within a run.
///
/// `step` counts optimizer updates across epochs and is the x-axis of the
/// per-step scalars; the first update is step 1.
#[derive(Debug, Clone, Copy)]
pub struct StepCounter {
    pub step: usize,
    pub log_every: usize,
}

impl StepCounter {
    pub fn new(log_every: usize) -> StepCounter {
        StepCounter { step: 0, log_every: log_every.max(1) }
    }
}

/// Fraction of rows whose argmax equals the label.
pub fn batch_accuracy(scores: &Matrix, labels: &[usize]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let correct = labels
        .iter()
        .enumerate()
        .filter(|&(r, &l)| argmax(scores.row(r)) == l)
        .count();
    correct as f64 / labels.len() as f64
}

/// One optimisation step on one batch. Returns the batch's mean loss.
///
/// The update is applied even when the loss is not finite; the step is
/// only flagged in the log.
pub fn train_step(
    scorer: &mut dyn Scorer,
    optimizer: &mut dyn Optimizer,
    batch: Batch,
    batch_idx: usize,
    counter: &mut StepCounter,
    sink: &mut dyn ScalarSink,
) -> Result<f64> {
    let labels = batch.labels;
    let scores = scorer.forward(batch.signals, Mode::Training);
    let (loss, grad) = CrossEntropyLoss::forward_backward(&scores, &labels);

    scorer.backward(&grad);
    optimizer.step(scorer);
    scorer.zero_grad();
    counter.step += 1;

    if !loss.is_finite() {
        warn!("step {}: training loss is {loss}", counter.step);
    }
    if batch_idx % counter.log_every == 0 {
        sink.add_scalar(ACC_TRAIN, batch_accuracy(&scores, &labels), counter.step)?;
    }
    sink.add_scalar(LOSS_TRAIN, loss, counter.step)?;

    Ok(loss)
}

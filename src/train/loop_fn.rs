use std::time::Instant;

use log::{debug, info};

use crate::data::dataset::{SegmentSet, Split};
use crate::error::{Error, Result};
use crate::eval::pipeline::{evaluate, Evaluation};
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::network::mode::Mode;
use crate::network::scorer::Scorer;
use crate::optim::plateau::ReduceLrOnPlateau;
use crate::optim::Optimizer;
use crate::summary::ScalarSink;
use crate::train::epoch_stats::EpochStats;
use crate::train::step::{train_step, StepCounter};
use crate::train::train_config::ExperimentConfig;

// Epoch-level scalar tags.
pub const F1_MACRO: &str = "F1/f1_score";
pub const LOSS_TEST: &str = "Loss/test";
pub const LEARNING_RATE: &str = "LR";

/// Tag of the per-class F1 series for `class`.
pub fn f1_label_tag(class: usize) -> String {
    format!("F1/label_{class}")
}

/// Scores every test segment in stored order without touching parameters
/// or gradients. Returns the mean cross-entropy and the patient-level
/// evaluation.
pub fn evaluate_scorer(
    scorer: &mut dyn Scorer,
    test: &SegmentSet,
    batch_size: usize,
) -> Result<(f64, Evaluation)> {
    let mut scores: Vec<Vec<f64>> = Vec::with_capacity(test.len());
    let mut loss_sum = 0.0;

    for batch in test.batches(batch_size) {
        let n = batch.len() as f64;
        let out = scorer.forward(batch.signals, Mode::Inference);
        loss_sum += CrossEntropyLoss::mean(&out, &batch.labels) * n;
        scores.extend(out.to_rows());
    }

    let val_loss = if test.is_empty() { 0.0 } else { loss_sum / test.len() as f64 };
    let evaluation = evaluate(&scores, &test.labels, &test.pids, scorer.n_classes())?;
    Ok((val_loss, evaluation))
}

/// Trains `scorer` for `config.epochs` epochs and returns one `EpochStats`
/// per epoch.
///
/// Each epoch runs every training batch through `train_step`, then scores
/// the test set in `Mode::Inference`, logs the patient-level F1 scalars and
/// feeds the mean test loss to the plateau scheduler. `seed` drives the
/// per-epoch shuffle.
pub fn train_loop(
    scorer: &mut dyn Scorer,
    optimizer: &mut dyn Optimizer,
    split: &Split,
    config: &ExperimentConfig,
    seed: u64,
    sink: &mut dyn ScalarSink,
) -> Result<Vec<EpochStats>> {
    let n_classes = scorer.n_classes();
    if split.train.is_empty() {
        return Err(Error::EmptyDataset("no training segments".into()));
    }
    if split.test.is_empty() {
        return Err(Error::EmptyDataset("no test segments to evaluate".into()));
    }
    split.train.validate(n_classes)?;
    split.test.validate(n_classes)?;

    let mut scheduler = ReduceLrOnPlateau::new(config.plateau.clone());
    let mut counter = StepCounter::new(config.log_every);
    let mut history = Vec::with_capacity(config.epochs);

    for epoch in 0..config.epochs {
        let t_start = Instant::now();
        let learning_rate = optimizer.learning_rate();

        // ── Train ─────────────────────────────────────────────────────────
        let batches = if config.shuffle {
            split.train.shuffled_batches(config.batch_size, seed, epoch)
        } else {
            split.train.batches(config.batch_size)
        };
        let mut loss_sum = 0.0;
        let mut n_batches = 0usize;
        for (batch_idx, batch) in batches.enumerate() {
            loss_sum += train_step(scorer, optimizer, batch, batch_idx, &mut counter, sink)?;
            n_batches += 1;
        }
        let train_loss = loss_sum / n_batches.max(1) as f64;

        // ── Evaluate ──────────────────────────────────────────────────────
        let (val_loss, evaluation) = evaluate_scorer(scorer, &split.test, config.batch_size)?;
        info!(
            "epoch {} confusion matrix (rows true, columns predicted):\n{}",
            epoch + 1,
            evaluation.confusion
        );
        debug!("epoch {} report:\n{}", epoch + 1, evaluation.report);

        sink.add_scalar(F1_MACRO, evaluation.macro_f1(), epoch)?;
        for (class, f1) in evaluation.per_class_f1().into_iter().enumerate() {
            sink.add_scalar(&f1_label_tag(class), f1, epoch)?;
        }
        sink.add_scalar(LOSS_TEST, val_loss, epoch)?;
        sink.add_scalar(LEARNING_RATE, learning_rate, epoch)?;

        // ── Schedule ──────────────────────────────────────────────────────
        scheduler.step(val_loss, optimizer);

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            train_loss,
            val_loss,
            learning_rate,
            macro_f1: evaluation.macro_f1(),
            per_class_f1: evaluation.per_class_f1(),
            n_patients: evaluation.votes.len(),
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        info!("{stats}");
        sink.flush()?;
        history.push(stats);
    }

    Ok(history)
}

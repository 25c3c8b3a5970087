use log::debug;

use crate::error::{Error, Result};
use crate::eval::report::{ClassificationReport, ConfusionMatrix};
use crate::eval::vote::{argmax, group_by_patient, vote_by_patient, PatientVotes};

/// Patient-level outcome of one evaluation pass.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub votes: PatientVotes,
    pub confusion: ConfusionMatrix,
    pub report: ClassificationReport,
}

impl Evaluation {
    pub fn macro_f1(&self) -> f64 {
        self.report.macro_f1
    }

    /// F1 of every class in `0..n_classes`, in class order.
    pub fn per_class_f1(&self) -> Vec<f64> {
        self.report.per_class.iter().map(|m| m.f1).collect()
    }
}

/// Turns per-segment score vectors into per-patient diagnoses and metrics.
///
/// 1. argmax of each score vector (lowest index on ties);
/// 2. segments grouped by patient id, ids ascending;
/// 3. majority vote of predictions and of true labels per patient
///    (first-seen class wins a tie);
/// 4. confusion matrix over the fixed class set and per-class / macro F1.
///
/// `scores`, `labels` and `pids` are parallel. A label or prediction outside
/// `0..n_classes` is an error.
pub fn evaluate(
    scores: &[Vec<f64>],
    labels: &[usize],
    pids: &[u64],
    n_classes: usize,
) -> Result<Evaluation> {
    for (what, len) in [("labels", labels.len()), ("patient ids", pids.len())] {
        if len != scores.len() {
            return Err(Error::LengthMismatch { what, expected: scores.len(), actual: len });
        }
    }
    if let Some(&label) = labels.iter().find(|&&l| l >= n_classes) {
        return Err(Error::LabelOutOfRange { label, n_classes });
    }

    let predictions: Vec<usize> = scores.iter().map(|s| argmax(s)).collect();
    let groups = group_by_patient(pids);
    let votes = vote_by_patient(&predictions, labels, &groups);

    let noisy = votes.inconsistent_patients(labels, &groups);
    if !noisy.is_empty() {
        debug!(
            "{} patient(s) carry mixed segment labels; majority label used: {:?}",
            noisy.len(),
            noisy
        );
    }

    let confusion = ConfusionMatrix::from_labels(&votes.truth, &votes.prediction, n_classes)?;
    let report = ClassificationReport::from_confusion(&confusion);

    Ok(Evaluation { votes, confusion, report })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hot_scores(classes: &[usize], k: usize) -> Vec<Vec<f64>> {
        classes
            .iter()
            .map(|&c| {
                let mut s = vec![0.0; k];
                s[c] = 1.0;
                s
            })
            .collect()
    }

    #[test]
    fn two_patient_scenario_is_perfect() {
        // Patient A (pid 0): truth 0, segments predicted [0, 0, 1].
        // Patient B (pid 1): truth 1, segments predicted [1, 1, 1].
        let scores = one_hot_scores(&[0, 0, 1, 1, 1, 1], 2);
        let labels = [0, 0, 0, 1, 1, 1];
        let pids = [0, 0, 0, 1, 1, 1];

        let eval = evaluate(&scores, &labels, &pids, 2).unwrap();
        assert_eq!(eval.votes.truth, vec![0, 1]);
        assert_eq!(eval.votes.prediction, vec![0, 1]);
        assert_eq!(eval.confusion.rows(), vec![vec![1, 0], vec![0, 1]]);
        assert_eq!(eval.per_class_f1(), vec![1.0, 1.0]);
        assert_eq!(eval.macro_f1(), 1.0);
    }

    #[test]
    fn four_class_macro_counts_unobserved_classes_as_zero() {
        let scores = one_hot_scores(&[0, 0, 1, 1, 1, 1], 4);
        let labels = [0, 0, 0, 1, 1, 1];
        let pids = [0, 0, 0, 1, 1, 1];

        let eval = evaluate(&scores, &labels, &pids, 4).unwrap();
        assert_eq!(eval.per_class_f1(), vec![1.0, 1.0, 0.0, 0.0]);
        assert_eq!(eval.macro_f1(), 0.5);
    }

    #[test]
    fn interleaved_patients_come_out_in_ascending_order() {
        let scores = one_hot_scores(&[3, 2, 3, 2], 4);
        let labels = [3, 2, 3, 2];
        let pids = [42, 7, 42, 7];

        let eval = evaluate(&scores, &labels, &pids, 4).unwrap();
        assert_eq!(eval.votes.patient_ids, vec![7, 42]);
        assert_eq!(eval.votes.truth, vec![2, 3]);
        assert_eq!(eval.votes.prediction, vec![2, 3]);
    }

    #[test]
    fn tied_segment_votes_follow_first_seen_class() {
        let scores = one_hot_scores(&[1, 2, 1, 2], 4);
        let eval = evaluate(&scores, &[1, 1, 1, 1], &[5, 5, 5, 5], 4).unwrap();
        assert_eq!(eval.votes.prediction, vec![1]);
    }

    #[test]
    fn length_mismatch_is_reported() {
        let scores = one_hot_scores(&[0, 1], 2);
        let err = evaluate(&scores, &[0, 1], &[0], 2).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { what: "patient ids", .. }));
    }

    #[test]
    fn empty_test_set_gives_empty_votes() {
        let eval = evaluate(&[], &[], &[], 4).unwrap();
        assert!(eval.votes.is_empty());
        assert_eq!(eval.macro_f1(), 0.0);
    }
}

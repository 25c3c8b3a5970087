use std::collections::BTreeMap;

/// Index of the largest score, lowest index on exact ties.
///
/// NaN scores never win; an all-NaN or empty vector yields class 0.
pub fn argmax(scores: &[f64]) -> usize {
    let mut best_idx = 0;
    let mut best = f64::NEG_INFINITY;
    for (i, &s) in scores.iter().enumerate() {
        // Strict `>` keeps the first index among equal maxima.
        if s > best {
            best = s;
            best_idx = i;
        }
    }
    best_idx
}

/// Most frequent value in `values`.
///
/// Tie-break: among values sharing the maximum count, the one whose first
/// occurrence comes earliest in `values` wins. Returns `None` for an empty
/// slice.
pub fn majority_vote(values: &[usize]) -> Option<usize> {
    // (value, count) in first-seen order.
    let mut counts: Vec<(usize, usize)> = Vec::new();
    for &v in values {
        match counts.iter_mut().find(|(seen, _)| *seen == v) {
            Some((_, count)) => *count += 1,
            None => counts.push((v, 1)),
        }
    }

    let mut winner: Option<(usize, usize)> = None;
    for (value, count) in counts {
        match winner {
            Some((_, best)) if count <= best => {}
            _ => winner = Some((value, count)),
        }
    }
    winner.map(|(value, _)| value)
}

/// Segment indices grouped by patient id, ascending by id.
///
/// Within a group the indices keep their original segment order, which is
/// what the vote tie-break relies on.
pub fn group_by_patient(pids: &[u64]) -> BTreeMap<u64, Vec<usize>> {
    let mut groups: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
    for (i, &pid) in pids.iter().enumerate() {
        groups.entry(pid).or_default().push(i);
    }
    groups
}

/// Per-patient majority votes, index-aligned with each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientVotes {
    /// Distinct patient ids, ascending.
    pub patient_ids: Vec<u64>,
    /// Majority ground-truth label per patient.
    pub truth: Vec<usize>,
    /// Majority segment prediction per patient.
    pub prediction: Vec<usize>,
}

impl PatientVotes {
    pub fn len(&self) -> usize {
        self.patient_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patient_ids.is_empty()
    }

    /// Patients whose segments did not all carry the same true label.
    /// Their aggregated ground truth is still the majority label.
    pub fn inconsistent_patients(
        &self,
        labels: &[usize],
        groups: &BTreeMap<u64, Vec<usize>>,
    ) -> Vec<u64> {
        groups
            .iter()
            .filter(|(_, idx)| idx.iter().any(|&i| labels[i] != labels[idx[0]]))
            .map(|(&pid, _)| pid)
            .collect()
    }
}

/// Aggregates per-segment predictions and labels into per-patient votes.
///
/// Both aggregates come from one pass over the same ascending id
/// enumeration, so index `i` in `truth` and `prediction` always refers to
/// `patient_ids[i]`. Inputs must be parallel slices of equal length.
pub fn vote_by_patient(
    predictions: &[usize],
    labels: &[usize],
    groups: &BTreeMap<u64, Vec<usize>>,
) -> PatientVotes {
    let mut votes = PatientVotes {
        patient_ids: Vec::with_capacity(groups.len()),
        truth: Vec::with_capacity(groups.len()),
        prediction: Vec::with_capacity(groups.len()),
    };

    for (&pid, idx) in groups {
        let preds: Vec<usize> = idx.iter().map(|&i| predictions[i]).collect();
        let gts: Vec<usize> = idx.iter().map(|&i| labels[i]).collect();
        // Groups are never empty: every id was inserted with a segment.
        if let (Some(p), Some(t)) = (majority_vote(&preds), majority_vote(&gts)) {
            votes.patient_ids.push(pid);
            votes.prediction.push(p);
            votes.truth.push(t);
        }
    }
    votes
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[0.2, 0.2, 0.5, 0.1], 2)]
    #[case(&[0.3, 0.3, 0.1, 0.1], 0)]
    #[case(&[0.1, 0.4, 0.4, 0.4], 1)]
    #[case(&[-1.0, -0.5], 1)]
    #[case(&[f64::NAN, 0.1, 0.3], 2)]
    #[case(&[], 0)]
    fn argmax_prefers_lowest_index_on_ties(#[case] scores: &[f64], #[case] expected: usize) {
        assert_eq!(argmax(scores), expected);
    }

    #[rstest]
    #[case(&[1, 2, 1, 2], Some(1))]
    #[case(&[2, 1, 1, 2], Some(2))]
    #[case(&[0, 0, 1], Some(0))]
    #[case(&[3, 1, 1], Some(1))]
    #[case(&[3], Some(3))]
    #[case(&[], None)]
    fn majority_vote_breaks_ties_by_first_occurrence(
        #[case] values: &[usize],
        #[case] expected: Option<usize>,
    ) {
        assert_eq!(majority_vote(values), expected);
    }

    #[test]
    fn winner_is_present_and_most_frequent() {
        let values = [2, 3, 3, 0, 2, 3, 1];
        let winner = majority_vote(&values).unwrap();
        let count = |v: usize| values.iter().filter(|&&x| x == v).count();
        assert!(values.contains(&winner));
        assert!((0..4).all(|c| count(winner) >= count(c)));
    }

    #[test]
    fn groups_are_ascending_and_keep_segment_order() {
        let groups = group_by_patient(&[7, 3, 7, 3, 5]);
        let keys: Vec<u64> = groups.keys().copied().collect();
        assert_eq!(keys, vec![3, 5, 7]);
        assert_eq!(groups[&7], vec![0, 2]);
        assert_eq!(groups[&3], vec![1, 3]);
    }

    #[test]
    fn votes_are_aligned_by_patient() {
        let pids = [20, 10, 20, 10, 20];
        let preds = [1, 0, 1, 2, 3];
        let labels = [1, 2, 1, 2, 1];
        let groups = group_by_patient(&pids);
        let votes = vote_by_patient(&preds, &labels, &groups);

        assert_eq!(votes.patient_ids, vec![10, 20]);
        // Patient 10: preds [0, 2] tie -> 0 (first seen); labels [2, 2].
        assert_eq!(votes.prediction, vec![0, 1]);
        assert_eq!(votes.truth, vec![2, 1]);
        assert_eq!(votes.len(), 2);
    }

    #[test]
    fn label_noise_is_masked_but_detectable() {
        let pids = [1, 1, 1];
        let labels = [2, 0, 2];
        let groups = group_by_patient(&pids);
        let votes = vote_by_patient(&[0, 0, 0], &labels, &groups);
        assert_eq!(votes.truth, vec![2]);
        assert_eq!(votes.inconsistent_patients(&labels, &groups), vec![1]);
    }
}

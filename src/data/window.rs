use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::dataset::SegmentSet;
use crate::math::matrix::Matrix;

/// One whole single-lead recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub pid: u64,
    pub label: usize,
    pub samples: Vec<f64>,
}

/// Rescales `samples` in place to zero mean and unit variance.
/// A constant (or empty) record becomes all zeros.
pub fn standardize(samples: &mut [f64]) {
    if samples.is_empty() {
        return;
    }
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let std = var.sqrt();
    for x in samples.iter_mut() {
        *x = if std > 0.0 { (*x - mean) / std } else { 0.0 };
    }
}

/// Start offsets of every full window of `window` samples taken every
/// `stride` samples from a record of `len` samples.
pub fn window_starts(len: usize, window: usize, stride: usize) -> impl Iterator<Item = usize> {
    let last = len.checked_sub(window);
    (0..=last.unwrap_or(0))
        .step_by(stride.max(1))
        .take_while(move |_| last.is_some())
}

/// Cuts every record into `window`-sample segments (one channel each),
/// tagging each with the record's label and pid. Records shorter than one
/// window contribute nothing.
pub fn slide_and_cut(records: &[Record], window: usize, stride: usize) -> SegmentSet {
    let mut out = SegmentSet::new();
    for r in records {
        for start in window_starts(r.samples.len(), window, stride) {
            let seg = r.samples[start..start + window].to_vec();
            out.push(Matrix::from_vec(1, window, seg), r.label, r.pid);
        }
    }
    out
}

/// Splits records by patient: distinct pids are shuffled with `seed` and the
/// last `round(test_fraction * n_patients)` (at least one when there are two
/// or more patients) go to the test side. No patient lands on both sides.
pub fn split_patients(records: Vec<Record>, test_fraction: f64, seed: u64) -> (Vec<Record>, Vec<Record>) {
    let mut pids: Vec<u64> = records.iter().map(|r| r.pid).collect();
    pids.sort_unstable();
    pids.dedup();

    let mut rng = StdRng::seed_from_u64(seed);
    pids.shuffle(&mut rng);

    let n = pids.len();
    let n_test = if n < 2 {
        0
    } else {
        ((test_fraction * n as f64).round() as usize).clamp(1, n - 1)
    };
    let test_ids: std::collections::HashSet<u64> = pids[n - n_test..].iter().copied().collect();

    records.into_iter().partition(|r| !test_ids.contains(&r.pid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(pid: u64, label: usize, len: usize) -> Record {
        Record { pid, label, samples: (0..len).map(|i| i as f64).collect() }
    }

    #[rstest]
    #[case(10, 4, 2, vec![0, 2, 4, 6])]
    #[case(10, 4, 3, vec![0, 3, 6])]
    #[case(4, 4, 2, vec![0])]
    #[case(3, 4, 1, vec![])]
    #[case(0, 4, 1, vec![])]
    fn window_start_offsets(
        #[case] len: usize,
        #[case] window: usize,
        #[case] stride: usize,
        #[case] expected: Vec<usize>,
    ) {
        assert_eq!(window_starts(len, window, stride).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn segments_carry_their_record_tags() {
        let records = vec![record(3, 1, 6), record(9, 0, 2), record(4, 2, 5)];
        let set = slide_and_cut(&records, 4, 2);
        assert_eq!(set.len(), 3);
        assert_eq!(set.pids, vec![3, 3, 4]);
        assert_eq!(set.labels, vec![1, 1, 2]);
        assert_eq!(set.signals[1].data, vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(set.signal_shape(), Some((1, 4)));
    }

    #[test]
    fn standardized_record_has_zero_mean_unit_variance() {
        let mut x = vec![1.0, 2.0, 3.0, 4.0, 10.0];
        standardize(&mut x);
        let mean = x.iter().sum::<f64>() / 5.0;
        let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 5.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);

        let mut flat = vec![5.0; 4];
        standardize(&mut flat);
        assert_eq!(flat, vec![0.0; 4]);
    }

    #[test]
    fn patient_split_is_disjoint_and_seeded() {
        let records: Vec<Record> = (0..20).flat_map(|p| [record(p, 0, 8), record(p, 0, 8)]).collect();
        let (train, test) = split_patients(records.clone(), 0.1, 42);
        assert_eq!(train.len() + test.len(), 40);
        assert_eq!(test.len(), 4);
        assert!(test.iter().all(|t| train.iter().all(|r| r.pid != t.pid)));

        let (_, again) = split_patients(records, 0.1, 42);
        assert_eq!(again, test);
    }

    #[test]
    fn tiny_patient_counts_keep_both_sides_sensible() {
        let (train, test) = split_patients(vec![record(1, 0, 4)], 0.5, 0);
        assert_eq!((train.len(), test.len()), (1, 0));

        let (train, test) = split_patients(vec![record(1, 0, 4), record(2, 1, 4)], 0.01, 0);
        assert_eq!((train.len(), test.len()), (1, 1));
    }
}

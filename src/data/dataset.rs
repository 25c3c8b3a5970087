use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Class names of the PhysioNet/CinC Challenge 2017 label set, by index.
pub const CHALLENGE_CLASSES: [&str; 4] = ["Normal", "AF", "Other", "Noisy"];

/// Parallel arrays of segments: signal (`channels x length`), true class and
/// the id of the patient the segment was cut from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentSet {
    pub signals: Vec<Matrix>,
    pub labels: Vec<usize>,
    pub pids: Vec<u64>,
}

impl SegmentSet {
    pub fn new() -> SegmentSet {
        SegmentSet::default()
    }

    pub fn push(&mut self, signal: Matrix, label: usize, pid: u64) {
        self.signals.push(signal);
        self.labels.push(label);
        self.pids.push(pid);
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Shape of one signal, `(channels, length)`, taken from the first segment.
    pub fn signal_shape(&self) -> Option<(usize, usize)> {
        self.signals.first().map(|s| s.shape())
    }

    pub fn n_patients(&self) -> usize {
        let mut ids = self.pids.clone();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Segments per class, for classes `0..n_classes`.
    pub fn class_counts(&self, n_classes: usize) -> Vec<usize> {
        let mut counts = vec![0; n_classes];
        for &l in &self.labels {
            if l < n_classes {
                counts[l] += 1;
            }
        }
        counts
    }

    /// Checks the parallel arrays agree and every label is in `0..n_classes`.
    pub fn validate(&self, n_classes: usize) -> Result<()> {
        for (what, len) in [("labels", self.labels.len()), ("patient ids", self.pids.len())] {
            if len != self.signals.len() {
                return Err(Error::LengthMismatch { what, expected: self.signals.len(), actual: len });
            }
        }
        if let Some(&label) = self.labels.iter().find(|&&l| l >= n_classes) {
            return Err(Error::LabelOutOfRange { label, n_classes });
        }
        Ok(())
    }

    /// Batches in stored order; used for evaluation.
    pub fn batches(&self, batch_size: usize) -> BatchIter<'_> {
        BatchIter::new(self, (0..self.len()).collect(), batch_size)
    }

    /// Batches in an order shuffled by `seed + epoch`, so every epoch sees a
    /// different but reproducible permutation.
    pub fn shuffled_batches(&self, batch_size: usize, seed: u64, epoch: usize) -> BatchIter<'_> {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(epoch as u64));
        indices.shuffle(&mut rng);
        BatchIter::new(self, indices, batch_size)
    }
}

/// One mini-batch of segments.
#[derive(Debug, Clone)]
pub struct Batch {
    pub signals: Vec<Matrix>,
    pub labels: Vec<usize>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Yields consecutive batches over a fixed index order. The last batch may
/// be smaller than `batch_size`.
pub struct BatchIter<'a> {
    set: &'a SegmentSet,
    indices: Vec<usize>,
    batch_size: usize,
    pos: usize,
}

impl<'a> BatchIter<'a> {
    fn new(set: &'a SegmentSet, indices: Vec<usize>, batch_size: usize) -> BatchIter<'a> {
        assert!(batch_size > 0, "batch_size must be at least 1");
        BatchIter { set, indices, batch_size, pos: 0 }
    }

    pub fn n_batches(&self) -> usize {
        self.indices.len().div_ceil(self.batch_size)
    }
}

impl Iterator for BatchIter<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.pos >= self.indices.len() {
            return None;
        }
        let end = (self.pos + self.batch_size).min(self.indices.len());
        let idx = &self.indices[self.pos..end];
        self.pos = end;
        Some(Batch {
            signals: idx.iter().map(|&i| self.set.signals[i].clone()).collect(),
            labels: idx.iter().map(|&i| self.set.labels[i]).collect(),
        })
    }
}

/// Training and held-out test segments.
#[derive(Debug, Clone, Default)]
pub struct Split {
    pub train: SegmentSet,
    pub test: SegmentSet,
}

/// Source of a train/test split of segments.
pub trait DataProvider {
    /// Loads the data and splits patients with a generator seeded by `seed`;
    /// each repetition of an experiment passes its own seed.
    fn load(&self, seed: u64) -> Result<Split>;
}

/// How whole records become segments.
///
/// Fields:
/// - `n_classes`     - 4 for the full label set, 2 keeps Normal/AF records only
/// - `window`        - samples per segment
/// - `train_stride`  - step between segment starts in training records
/// - `test_stride`   - step between segment starts in held-out records
/// - `test_fraction` - share of patients held out for evaluation
/// - `standardize`   - z-score each record before cutting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub n_classes: usize,
    pub window: usize,
    pub train_stride: usize,
    pub test_stride: usize,
    pub test_fraction: f64,
    pub standardize: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            n_classes: 4,
            window: 3000,
            train_stride: 500,
            test_stride: 500,
            test_fraction: 0.1,
            standardize: true,
        }
    }
}

impl DataConfig {
    pub fn validate(&self) -> Result<()> {
        if !(2..=CHALLENGE_CLASSES.len()).contains(&self.n_classes) {
            return Err(Error::InvalidConfig(format!(
                "n_classes must be between 2 and {}, got {}",
                CHALLENGE_CLASSES.len(),
                self.n_classes
            )));
        }
        if self.window == 0 || self.train_stride == 0 || self.test_stride == 0 {
            return Err(Error::InvalidConfig("window and strides must be at least 1".into()));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "test_fraction must lie in (0, 1), got {}",
                self.test_fraction
            )));
        }
        Ok(())
    }

    pub fn class_names(&self) -> Vec<String> {
        CHALLENGE_CLASSES[..self.n_classes].iter().map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(n: usize) -> SegmentSet {
        let mut s = SegmentSet::new();
        for i in 0..n {
            s.push(Matrix::from_vec(1, 2, vec![i as f64, 0.0]), i % 2, (i / 3) as u64);
        }
        s
    }

    #[test]
    fn batches_cover_every_segment_once() {
        let s = set(10);
        let batches: Vec<Batch> = s.batches(4).collect();
        assert_eq!(batches.iter().map(|b| b.len()).collect::<Vec<_>>(), vec![4, 4, 2]);
        assert_eq!(s.batches(4).n_batches(), 3);

        let mut seen: Vec<f64> = s
            .shuffled_batches(3, 7, 0)
            .flat_map(|b| b.signals.into_iter().map(|m| m.data[0]))
            .collect();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(seen, (0..10).map(|i| i as f64).collect::<Vec<_>>());
    }

    #[test]
    fn shuffles_are_reproducible_and_change_per_epoch() {
        let s = set(32);
        let order = |epoch| -> Vec<usize> {
            s.shuffled_batches(32, 1, epoch)
                .next()
                .unwrap()
                .signals
                .iter()
                .map(|m| m.data[0] as usize)
                .collect()
        };
        assert_eq!(order(0), order(0));
        assert_ne!(order(0), order(1));
    }

    #[test]
    fn evaluation_batches_keep_stored_order() {
        let s = set(5);
        let first: Vec<usize> = s.batches(5).next().unwrap().labels;
        assert_eq!(first, s.labels);
    }

    #[test]
    fn validate_rejects_out_of_range_labels() {
        let mut s = set(3);
        s.labels[1] = 4;
        assert!(matches!(
            s.validate(4),
            Err(Error::LabelOutOfRange { label: 4, n_classes: 4 })
        ));
    }

    #[test]
    fn data_config_validation() {
        let cfg = DataConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.class_names(), vec!["Normal", "AF", "Other", "Noisy"]);
        assert!(DataConfig { n_classes: 5, ..DataConfig::default() }.validate().is_err());
        assert!(DataConfig { test_fraction: 1.0, ..DataConfig::default() }.validate().is_err());
        assert!(DataConfig { train_stride: 0, ..DataConfig::default() }.validate().is_err());
    }

    #[test]
    fn patient_counting() {
        assert_eq!(set(7).n_patients(), 3);
        assert_eq!(set(7).class_counts(2), vec![4, 3]);
    }
}

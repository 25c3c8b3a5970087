use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::csv::records_to_split;
use crate::data::dataset::{DataConfig, DataProvider, Split};
use crate::data::window::Record;
use crate::error::Result;

/// Generates ECG-like toy records whose shape depends on the class, so small
/// scorers can be trained end to end without the Challenge data.
///
/// - class 0: regular beats
/// - class 1: beats with jittered spacing
/// - class 2: regular beats at a faster rate with a wider wave
/// - class 3: mostly noise
///
/// `seed` fixes the waveforms; the seed passed to `load` only drives the
/// patient split.
#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    pub patients_per_class: usize,
    pub record_len: usize,
    pub config: DataConfig,
    pub seed: u64,
}

impl SyntheticProvider {
    pub fn new(patients_per_class: usize, record_len: usize, config: DataConfig, seed: u64) -> SyntheticProvider {
        SyntheticProvider { patients_per_class, record_len, config, seed }
    }

    pub fn records(&self) -> Vec<Record> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut records = Vec::with_capacity(self.patients_per_class * self.config.n_classes);
        let mut pid = 0u64;
        for _ in 0..self.patients_per_class {
            for label in 0..self.config.n_classes {
                let samples = waveform(label, self.record_len, &mut rng);
                records.push(Record { pid, label, samples });
                pid += 1;
            }
        }
        records
    }
}

impl DataProvider for SyntheticProvider {
    fn load(&self, seed: u64) -> Result<Split> {
        self.config.validate()?;
        records_to_split(self.records(), &self.config, seed)
    }
}

fn waveform<R: Rng>(label: usize, len: usize, rng: &mut R) -> Vec<f64> {
    let (period, width, jitter, noise) = match label {
        0 => (40.0, 3.0, 0.0, 0.05),
        1 => (40.0, 3.0, 15.0, 0.05),
        2 => (25.0, 6.0, 0.0, 0.05),
        _ => (40.0, 3.0, 0.0, 1.0),
    };

    let mut beats = Vec::new();
    let mut t = rng.gen_range(0.0..period);
    while t < len as f64 + period {
        beats.push(t);
        t += period + if jitter > 0.0 { rng.gen_range(-jitter..jitter) } else { 0.0 };
    }

    (0..len)
        .map(|i| {
            let x = i as f64;
            let beat: f64 = beats
                .iter()
                .map(|&b| (-(x - b).powi(2) / (2.0 * width * width)).exp())
                .sum();
            let baseline = 0.1 * (2.0 * PI * x / 400.0).sin();
            beat + baseline + noise * rng.gen_range(-1.0..1.0)
        })
        .collect()
}

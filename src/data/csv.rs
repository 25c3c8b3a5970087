//! Record CSV loading.
//!
//! Supported format:
//! - UTF-8, comma-separated, one whole recording per row
//! - `pid,label,v1,...,vn`; rows may differ in length
//! - Optional header row (auto-detected: the first row is a header if any
//!   sample cell is non-numeric)
//! - Double-quoted fields with embedded commas are handled
//!
//! `pid` is a non-negative integer, optionally prefixed by letters as in the
//! Challenge record names (`A00042` is patient 42). `label` is either a class
//! index or one of the Challenge codes `N`, `A`, `O`, `~`.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::data::dataset::{DataConfig, DataProvider, Split, CHALLENGE_CLASSES};
use crate::data::window::{slide_and_cut, split_patients, standardize, Record};
use crate::error::{Error, Result};

const CHALLENGE_CODES: [&str; 4] = ["N", "A", "O", "~"];

/// Parses record CSV text. Labels outside the Challenge class set are
/// errors; range checks against a smaller class set are left to the caller.
pub fn parse_records(text: &str) -> Result<Vec<Record>> {
    let mut lines = text.lines().enumerate().peekable();

    if let Some((_, first)) = lines.peek() {
        if is_header(first) {
            lines.next();
        }
    }

    let mut records = Vec::new();
    for (line_idx, line) in lines {
        let row = line_idx + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let cells = parse_csv_row(line);
        if cells.len() < 3 {
            return Err(Error::Csv {
                row,
                message: format!("expected pid, label and at least one sample, got {} column(s)", cells.len()),
            });
        }

        let pid = parse_pid(&cells[0]).ok_or_else(|| Error::Csv {
            row,
            message: format!("'{}' is not a patient id", cells[0].trim()),
        })?;
        let label = parse_label(&cells[1], row)?;
        let samples = parse_floats(&cells[2..], row)?;

        records.push(Record { pid, label, samples });
    }

    if records.is_empty() {
        return Err(Error::EmptyDataset("CSV contains no data rows".into()));
    }
    Ok(records)
}

/// Loads whole records from a CSV file and turns them into a patient-level
/// train/test split of windowed segments.
#[derive(Debug, Clone)]
pub struct CsvRecordProvider {
    pub path: PathBuf,
    pub config: DataConfig,
}

impl CsvRecordProvider {
    pub fn new(path: impl AsRef<Path>, config: DataConfig) -> CsvRecordProvider {
        CsvRecordProvider { path: path.as_ref().to_path_buf(), config }
    }
}

impl DataProvider for CsvRecordProvider {
    fn load(&self, seed: u64) -> Result<Split> {
        self.config.validate()?;
        let text = fs::read_to_string(&self.path)?;
        let records = parse_records(&text)?;
        records_to_split(records, &self.config, seed)
    }
}

/// Filters, standardises, splits and windows parsed records.
pub fn records_to_split(records: Vec<Record>, config: &DataConfig, seed: u64) -> Result<Split> {
    let total = records.len();
    let mut kept: Vec<Record> = records
        .into_iter()
        .filter(|r| r.label < config.n_classes)
        .collect();
    if kept.len() < total {
        debug!(
            "dropped {} record(s) outside the {}-class set",
            total - kept.len(),
            config.n_classes
        );
    }

    let short = kept.iter().filter(|r| r.samples.len() < config.window).count();
    if short > 0 {
        debug!("{short} record(s) are shorter than one {}-sample window", config.window);
    }
    if config.standardize {
        for r in kept.iter_mut() {
            standardize(&mut r.samples);
        }
    }

    let (train_records, test_records) = split_patients(kept, config.test_fraction, seed);
    let split = Split {
        train: slide_and_cut(&train_records, config.window, config.train_stride),
        test: slide_and_cut(&test_records, config.window, config.test_stride),
    };

    if split.train.is_empty() {
        return Err(Error::EmptyDataset("no training segments after windowing".into()));
    }
    info!(
        "loaded {} train segments ({} patients), {} test segments ({} patients); train class counts {:?}",
        split.train.len(),
        split.train.n_patients(),
        split.test.len(),
        split.test.n_patients(),
        split.train.class_counts(config.n_classes),
    );
    Ok(split)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Returns `true` if any sample cell (third column onward) is non-numeric.
fn is_header(line: &str) -> bool {
    parse_csv_row(line).iter().skip(2).any(|c| {
        let t = c.trim();
        !t.is_empty() && t.parse::<f64>().is_err()
    })
}

/// Splits a single CSV row, handling double-quoted fields.
fn parse_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn parse_pid(cell: &str) -> Option<u64> {
    let digits = cell.trim().trim_start_matches(|c: char| c.is_ascii_alphabetic());
    digits.parse::<u64>().ok()
}

fn parse_label(cell: &str, row: usize) -> Result<usize> {
    let t = cell.trim();
    let label = match CHALLENGE_CODES.iter().position(|code| *code == t) {
        Some(idx) => idx,
        None => t.parse::<usize>().map_err(|_| Error::Csv {
            row,
            message: format!("label '{t}' is neither a class index nor one of {CHALLENGE_CODES:?}"),
        })?,
    };
    if label >= CHALLENGE_CLASSES.len() {
        return Err(Error::Csv {
            row,
            message: format!("label {label} is outside the class set 0..{}", CHALLENGE_CLASSES.len()),
        });
    }
    Ok(label)
}

fn parse_floats(cells: &[String], row: usize) -> Result<Vec<f64>> {
    cells
        .iter()
        .filter(|c| !c.trim().is_empty())
        .map(|c| {
            c.trim().parse::<f64>().map_err(|_| Error::Csv {
                row,
                message: format!("'{}' is not a valid number", c.trim()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn header_is_skipped_and_codes_are_mapped() {
        let text = "pid,label,v1,v2,v3\nA00001,N,1,2,3\nA00002,~,4,5\n7,2,0.5,\"0.25\",1\n";
        let records = parse_records(text).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], Record { pid: 1, label: 0, samples: vec![1.0, 2.0, 3.0] });
        assert_eq!(records[1].label, 3);
        assert_eq!(records[1].samples.len(), 2);
        assert_eq!(records[2].samples, vec![0.5, 0.25, 1.0]);
    }

    #[test]
    fn out_of_range_label_reports_its_row() {
        let text = "pid,label,v1\n1,0,0.1\n2,4,0.2\n";
        match parse_records(text) {
            Err(Error::Csv { row, message }) => {
                assert_eq!(row, 3);
                assert!(message.contains("label 4"));
            }
            other => panic!("expected a CSV error, got {other:?}"),
        }
    }

    #[test]
    fn bad_sample_reports_its_row() {
        let err = parse_records("1,0,0.1,0.2\n2,1,0.3,oops\n").unwrap_err();
        assert!(matches!(err, Error::Csv { row: 2, .. }));
    }

    #[test]
    fn header_only_file_is_empty() {
        assert!(matches!(parse_records("pid,label,v1\n"), Err(Error::EmptyDataset(_))));
    }

    #[test]
    fn binary_variant_keeps_normal_and_af_only() {
        let records: Vec<Record> = (0..40)
            .map(|p| Record { pid: p, label: (p % 4) as usize, samples: vec![p as f64; 12] })
            .collect();
        let cfg = DataConfig {
            n_classes: 2,
            window: 6,
            train_stride: 3,
            test_stride: 6,
            test_fraction: 0.25,
            standardize: false,
        };
        let split = records_to_split(records, &cfg, 3).unwrap();
        assert!(split.train.labels.iter().chain(&split.test.labels).all(|&l| l < 2));
        // 20 binary patients, 5 held out; 3 train windows and 2 test windows each.
        assert_eq!(split.test.n_patients(), 5);
        assert_eq!(split.train.len(), 15 * 3);
        assert_eq!(split.test.len(), 5 * 2);
    }

    #[test]
    fn provider_reads_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for p in 0..10 {
            let samples: Vec<String> = (0..8).map(|i| ((i * (p + 1)) as f64).to_string()).collect();
            writeln!(file, "{p},{},{}", p % 2, samples.join(",")).unwrap();
        }
        let cfg = DataConfig {
            n_classes: 2,
            window: 4,
            train_stride: 2,
            test_stride: 4,
            test_fraction: 0.2,
            standardize: true,
        };
        let split = CsvRecordProvider::new(file.path(), cfg).load(11).unwrap();
        assert_eq!(split.test.n_patients(), 2);
        assert_eq!(split.train.signal_shape(), Some((1, 4)));
        assert!(split.train.signals.iter().all(|s| s.data.iter().all(|v| v.is_finite())));
    }
}

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Serialize, Deserialize};

use crate::error::Result;

/// File name of the scalar log inside a run directory.
pub const SCALARS_FILE: &str = "scalars.jsonl";

/// One logged scalar. Non-finite values serialise as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarEntry {
    pub tag: String,
    pub value: Option<f64>,
    pub step: usize,
    pub wall_time: f64,
}

/// Destination for tagged scalar series such as `Loss/train`.
pub trait ScalarSink {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Appends one JSON object per scalar to `<run_dir>/scalars.jsonl`.
pub struct JsonlSummaryWriter {
    run_dir: PathBuf,
    out: BufWriter<File>,
}

impl JsonlSummaryWriter {
    /// Creates `run_dir` if needed and starts a fresh scalar log in it.
    pub fn create(run_dir: impl AsRef<Path>) -> Result<JsonlSummaryWriter> {
        let run_dir = run_dir.as_ref().to_path_buf();
        fs::create_dir_all(&run_dir)?;
        let file = File::create(run_dir.join(SCALARS_FILE))?;
        Ok(JsonlSummaryWriter { run_dir, out: BufWriter::new(file) })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Reads back every entry of a scalar log.
    pub fn read(path: impl AsRef<Path>) -> Result<Vec<ScalarEntry>> {
        let reader = BufReader::new(File::open(path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                entries.push(serde_json::from_str(&line)?);
            }
        }
        Ok(entries)
    }
}

impl ScalarSink for JsonlSummaryWriter {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        let wall_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        let entry = ScalarEntry {
            tag: tag.to_string(),
            value: value.is_finite().then_some(value),
            step,
            wall_time,
        };
        serde_json::to_writer(&mut self.out, &entry)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Keeps every scalar in memory, in logging order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub entries: Vec<(String, f64, usize)>,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }

    /// `(step, value)` pairs logged under `tag`.
    pub fn series(&self, tag: &str) -> Vec<(usize, f64)> {
        self.entries
            .iter()
            .filter(|(t, _, _)| t == tag)
            .map(|&(_, v, s)| (s, v))
            .collect()
    }

    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.entries.iter().map(|(t, _, _)| t.clone()).collect();
        tags.sort();
        tags.dedup();
        tags
    }
}

impl ScalarSink for MemorySink {
    fn add_scalar(&mut self, tag: &str, value: f64, step: usize) -> Result<()> {
        self.entries.push((tag.to_string(), value, step));
        Ok(())
    }
}

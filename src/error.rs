use thiserror::Error;

/// Errors surfaced by the library.
///
/// Shape mismatches inside the numeric layer are programming errors and
/// panic instead; everything that depends on user input ends up here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV row {row}: {message}")]
    Csv { row: usize, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("length mismatch: {what} has {actual} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("label {label} is outside the class set 0..{n_classes}")]
    LabelOutOfRange { label: usize, n_classes: usize },

    #[error("empty dataset: {0}")]
    EmptyDataset(String),
}

pub type Result<T> = std::result::Result<T, Error>;

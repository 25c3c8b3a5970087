pub mod csv;
pub mod dataset;
pub mod synthetic;
pub mod window;

pub use csv::CsvRecordProvider;
pub use dataset::{Batch, BatchIter, DataConfig, DataProvider, SegmentSet, Split, CHALLENGE_CLASSES};
pub use synthetic::SyntheticProvider;
pub use window::Record;

pub mod writer;

pub use writer::{JsonlSummaryWriter, MemorySink, ScalarEntry, ScalarSink};

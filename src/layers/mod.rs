pub mod activation;
pub mod conv1d;
pub mod dense;
pub mod dropout;
pub mod param;
pub mod pool;

pub use activation::Activation;
pub use conv1d::Conv1d;
pub use dense::Dense;
pub use dropout::Dropout;
pub use param::Param;
pub use pool::{GlobalAvgPool, MaxPool1d};

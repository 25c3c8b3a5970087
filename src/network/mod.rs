pub mod checkpoint;
pub mod config;
pub mod metadata;
pub mod mode;
pub mod resnet1d;
pub mod scorer;

pub use checkpoint::SavedModel;
pub use config::{BlockPlan, ResNetConfig};
pub use metadata::ModelMetadata;
pub use mode::Mode;
pub use resnet1d::ResNet1d;
pub use scorer::Scorer;

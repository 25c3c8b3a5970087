use serde::{Serialize, Deserialize};

/// Execution mode passed to every forward pass.
///
/// - `Training`  - dropout is active and layers cache what backprop needs.
/// - `Inference` - dropout is the identity and nothing is cached, so a
///   following `backward` call is a programming error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Training,
    Inference,
}

impl Mode {
    pub fn is_training(self) -> bool {
        self == Mode::Training
    }
}

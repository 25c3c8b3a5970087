use serde::{Deserialize, Serialize};

/// Optional annotations stored next to saved weights.
/// All fields are Option<> so a bare weights file still deserializes.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ModelMetadata {
    pub description: Option<String>,
    /// Human-readable class names, index-aligned with the score vector
    /// (e.g. ["Normal", "AF", "Other", "Noisy"]).
    pub class_names: Option<Vec<String>>,
    /// Epochs the weights were trained for.
    pub epochs: Option<usize>,
    /// Macro F1 on the held-out patients after the last epoch.
    pub final_macro_f1: Option<f64>,
}

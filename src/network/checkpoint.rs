use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::network::metadata::ModelMetadata;
use crate::network::resnet1d::ResNet1d;
use crate::network::scorer::Scorer;
use crate::network::config::ResNetConfig;

/// Architecture plus trained parameter values, in `visit_params` order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedModel {
    pub config: ResNetConfig,
    pub params: Vec<Matrix>,
    #[serde(default)]
    pub metadata: Option<ModelMetadata>,
}

impl SavedModel {
    pub fn from_network(network: &ResNet1d, metadata: Option<ModelMetadata>) -> SavedModel {
        let mut params = Vec::new();
        network.visit_params(&mut |p| params.push(p.value.clone()));
        SavedModel {
            config: network.config.clone(),
            params,
            metadata,
        }
    }

    /// Rebuilds the network and copies the stored values into it.
    pub fn into_network(self) -> Result<ResNet1d> {
        self.config.validate()?;
        let mut network = ResNet1d::new(self.config, 0);

        let mut expected = 0;
        network.visit_params(&mut |_| expected += 1);
        if expected != self.params.len() {
            return Err(Error::LengthMismatch {
                what: "saved parameter list",
                expected,
                actual: self.params.len(),
            });
        }

        let mut shape_error = None;
        let mut stored = self.params.into_iter();
        network.visit_params_mut(&mut |p| {
            if let Some(value) = stored.next() {
                if value.shape() != p.value.shape() {
                    shape_error.get_or_insert(Error::LengthMismatch {
                        what: "saved parameter tensor",
                        expected: p.value.len(),
                        actual: value.len(),
                    });
                } else {
                    p.value = value;
                }
            }
        });
        match shape_error {
            Some(err) => Err(err),
            None => Ok(network),
        }
    }

    /// Serializes the model to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a model from a JSON file previously written by `save_json`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<SavedModel> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::network::mode::Mode;

    fn config() -> ResNetConfig {
        ResNetConfig {
            in_channels: 1,
            base_filters: 2,
            kernel_size: 3,
            stride: 2,
            n_block: 2,
            n_classes: 2,
            downsample_gap: 2,
            increasefilter_gap: 4,
            use_dropout: false,
            dropout: 0.0,
            activation: ActivationFunction::ReLU,
        }
    }

    #[test]
    fn restored_network_scores_identically() {
        let mut original = ResNet1d::new(config(), 17);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let meta = ModelMetadata {
            class_names: Some(vec!["Normal".into(), "AF".into()]),
            ..Default::default()
        };
        SavedModel::from_network(&original, Some(meta.clone()))
            .save_json(&path)
            .unwrap();

        let loaded = SavedModel::load_json(&path).unwrap();
        assert_eq!(loaded.metadata, Some(meta));
        let mut restored = loaded.into_network().unwrap();

        let x = vec![Matrix::from_vec(1, 8, (0..8).map(|i| i as f64 / 8.0).collect())];
        assert_eq!(
            original.forward(x.clone(), Mode::Inference),
            restored.forward(x, Mode::Inference)
        );
    }

    #[test]
    fn truncated_parameter_list_is_rejected() {
        let network = ResNet1d::new(config(), 1);
        let mut saved = SavedModel::from_network(&network, None);
        saved.params.pop();
        assert!(matches!(
            saved.into_network(),
            Err(Error::LengthMismatch { .. })
        ));
    }
}

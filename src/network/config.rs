use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};

/// Hyperparameters of the residual 1-D conv scorer.
///
/// Fields:
/// - `in_channels`        - channels per input signal (1 for single-lead ECG)
/// - `base_filters`       - width of the stem and of the first stage
/// - `kernel_size`        - taps of every convolution
/// - `stride`             - stride of downsampling blocks (and their skip pooling)
/// - `n_block`            - number of residual blocks
/// - `n_classes`          - width of the score vector
/// - `downsample_gap`     - block `i` downsamples when `i % downsample_gap == 1`
/// - `increasefilter_gap` - block `i > 0` doubles its channels when
///                          `i % increasefilter_gap == 0`
/// - `use_dropout`        - insert dropout before each block convolution
/// - `dropout`            - drop probability when `use_dropout` is set
/// - `activation`         - non-linearity between convolutions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResNetConfig {
    pub in_channels: usize,
    pub base_filters: usize,
    pub kernel_size: usize,
    pub stride: usize,
    pub n_block: usize,
    pub n_classes: usize,
    pub downsample_gap: usize,
    pub increasefilter_gap: usize,
    pub use_dropout: bool,
    pub dropout: f64,
    pub activation: ActivationFunction,
}

/// Shape of one residual block, derived from a `ResNetConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPlan {
    pub in_channels: usize,
    pub out_channels: usize,
    pub downsample: bool,
    pub is_first: bool,
}

impl ResNetConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("in_channels", self.in_channels),
            ("base_filters", self.base_filters),
            ("kernel_size", self.kernel_size),
            ("stride", self.stride),
            ("downsample_gap", self.downsample_gap),
            ("increasefilter_gap", self.increasefilter_gap),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{name} must be at least 1")));
            }
        }
        if self.n_classes < 2 {
            return Err(Error::InvalidConfig(format!(
                "n_classes must be at least 2, got {}",
                self.n_classes
            )));
        }
        if self.use_dropout && !(0.0..1.0).contains(&self.dropout) {
            return Err(Error::InvalidConfig(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }

    /// Channel and downsampling schedule for every block.
    pub fn block_plan(&self) -> Vec<BlockPlan> {
        (0..self.n_block)
            .map(|i| {
                if i == 0 {
                    return BlockPlan {
                        in_channels: self.base_filters,
                        out_channels: self.base_filters,
                        downsample: false,
                        is_first: true,
                    };
                }
                let in_channels = self.base_filters << ((i - 1) / self.increasefilter_gap);
                let out_channels = if i % self.increasefilter_gap == 0 {
                    in_channels * 2
                } else {
                    in_channels
                };
                BlockPlan {
                    in_channels,
                    out_channels,
                    downsample: i % self.downsample_gap == 1,
                    is_first: false,
                }
            })
            .collect()
    }

    /// Channels entering the dense head.
    pub fn head_channels(&self) -> usize {
        self.block_plan()
            .last()
            .map_or(self.base_filters, |b| b.out_channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(n_block: usize) -> ResNetConfig {
        ResNetConfig {
            in_channels: 1,
            base_filters: 8,
            kernel_size: 16,
            stride: 2,
            n_block,
            n_classes: 4,
            downsample_gap: 6,
            increasefilter_gap: 12,
            use_dropout: true,
            dropout: 0.5,
            activation: ActivationFunction::ReLU,
        }
    }

    #[test]
    fn block_plan_doubles_channels_every_gap() {
        let plan = config(48).block_plan();
        assert_eq!(plan.len(), 48);
        assert!(plan[0].is_first);
        assert_eq!(plan[11].out_channels, 8);
        assert_eq!((plan[12].in_channels, plan[12].out_channels), (8, 16));
        assert_eq!(plan[13].in_channels, 16);
        assert_eq!(plan[47].out_channels, 64);
        assert_eq!(config(48).head_channels(), 64);
    }

    #[test]
    fn block_plan_downsamples_at_gap_offsets() {
        let downsampling: Vec<usize> = config(14)
            .block_plan()
            .iter()
            .enumerate()
            .filter(|(_, b)| b.downsample)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(downsampling, vec![1, 7, 13]);
    }

    #[test]
    fn validate_rejects_single_class() {
        let mut cfg = config(2);
        cfg.n_classes = 1;
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn zero_blocks_head_uses_base_filters() {
        assert_eq!(config(0).head_channels(), 8);
    }
}

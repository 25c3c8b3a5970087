use serde::{Serialize, Deserialize};
use std::f64::consts::{E, PI};

/// Element-wise non-linearity used inside the residual blocks.
///
/// The ResNet1D preset uses `ReLU`; the Net1D preset uses `Swish`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    #[serde(rename = "relu")]
    ReLU,
    #[serde(rename = "leaky_relu")]
    LeakyReLU { alpha: f64 },
    Elu { alpha: f64 },
    Gelu,
    Swish,
    Tanh,
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::Elu { alpha } => {
                if x > 0.0 { x } else { alpha * (E.powf(x) - 1.0) }
            }
            ActivationFunction::Gelu => {
                let c = (2.0_f64 / PI).sqrt();
                0.5 * x * (1.0 + (c * (x + 0.044715 * x.powi(3))).tanh())
            }
            ActivationFunction::Swish => x / (1.0 + E.powf(-x)),
            ActivationFunction::Tanh => x.tanh(),
        }
    }

    /// Derivative with respect to the pre-activation input `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { 1.0 } else { *alpha },
            ActivationFunction::Elu { alpha } => {
                if x > 0.0 { 1.0 } else { alpha * E.powf(x) }
            }
            ActivationFunction::Gelu => {
                let c = (2.0_f64 / PI).sqrt();
                let inner = c * (x + 0.044715 * x.powi(3));
                let tanh_inner = inner.tanh();
                let sech2 = 1.0 - tanh_inner * tanh_inner;
                let d_inner = c * (1.0 + 3.0 * 0.044715 * x.powi(2));
                0.5 * tanh_inner + 0.5 * x * sech2 * d_inner + 0.5
            }
            ActivationFunction::Swish => {
                let sig = 1.0 / (1.0 + E.powf(-x));
                sig + x * sig * (1.0 - sig)
            }
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_derivative(f: ActivationFunction, x: f64) -> f64 {
        let h = 1e-6;
        (f.function(x + h) - f.function(x - h)) / (2.0 * h)
    }

    #[test]
    fn analytic_derivatives_match_finite_differences() {
        let fns = [
            ActivationFunction::LeakyReLU { alpha: 0.01 },
            ActivationFunction::Elu { alpha: 1.0 },
            ActivationFunction::Gelu,
            ActivationFunction::Swish,
            ActivationFunction::Tanh,
        ];
        for f in fns {
            for x in [-2.0, -0.3, 0.4, 1.7] {
                let diff = (f.derivative(x) - numeric_derivative(f, x)).abs();
                assert!(diff < 1e-5, "{f:?} at {x}: {diff}");
            }
        }
    }

    #[test]
    fn relu_clamps_negatives() {
        assert_eq!(ActivationFunction::ReLU.function(-3.0), 0.0);
        assert_eq!(ActivationFunction::ReLU.function(2.5), 2.5);
        assert_eq!(ActivationFunction::ReLU.derivative(-1.0), 0.0);
    }

    #[test]
    fn serde_names_are_snake_case() {
        let json = serde_json::to_string(&ActivationFunction::ReLU).unwrap();
        assert_eq!(json, "\"relu\"");
        let swish: ActivationFunction = serde_json::from_str("\"swish\"").unwrap();
        assert_eq!(swish, ActivationFunction::Swish);
    }
}

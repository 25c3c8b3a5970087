pub mod adam;
pub mod plateau;
pub mod sgd;

use serde::{Serialize, Deserialize};

use crate::network::scorer::Scorer;

pub use adam::Adam;
pub use plateau::{PlateauConfig, ReduceLrOnPlateau};
pub use sgd::Sgd;

/// Applies accumulated gradients to a scorer's parameters.
///
/// Gradients are not cleared here; the training step calls
/// `Scorer::zero_grad` after every update.
pub trait Optimizer {
    fn step(&mut self, scorer: &mut dyn Scorer);
    fn learning_rate(&self) -> f64;
    fn set_learning_rate(&mut self, lr: f64);
}

/// Which optimizer an experiment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Adam,
    Sgd,
}

impl OptimizerKind {
    pub fn build(self, learning_rate: f64, weight_decay: f64) -> Box<dyn Optimizer> {
        match self {
            OptimizerKind::Adam => Box::new(Adam::new(learning_rate, weight_decay)),
            OptimizerKind::Sgd => Box::new(Sgd::new(learning_rate, weight_decay)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::param::Param;
    use crate::math::matrix::Matrix;
    use crate::network::mode::Mode;

    /// One scalar parameter; the test writes its gradient directly.
    struct Scalar {
        p: Param,
    }

    impl Scalar {
        fn new(value: f64, grad: f64) -> Scalar {
            let mut p = Param::new(Matrix::from_vec(1, 1, vec![value]));
            p.grad.data[0] = grad;
            Scalar { p }
        }

        fn value(&self) -> f64 {
            self.p.value.data[0]
        }
    }

    impl Scorer for Scalar {
        fn n_classes(&self) -> usize {
            1
        }
        fn forward(&mut self, batch: Vec<Matrix>, _mode: Mode) -> Matrix {
            Matrix::zeros(batch.len(), 1)
        }
        fn backward(&mut self, _grad_scores: &Matrix) {}
        fn visit_params_mut(&mut self, f: &mut dyn FnMut(&mut Param)) {
            f(&mut self.p);
        }
        fn visit_params(&self, f: &mut dyn FnMut(&Param)) {
            f(&self.p);
        }
    }

    #[test]
    fn sgd_applies_weight_decay() {
        let mut s = Scalar::new(2.0, 0.5);
        let mut opt = Sgd::new(0.1, 0.1);
        opt.step(&mut s);
        // 2 - 0.1 * (0.5 + 0.1 * 2)
        assert!((s.value() - 1.93).abs() < 1e-12);
    }

    #[test]
    fn adam_first_step_moves_by_learning_rate() {
        let mut s = Scalar::new(1.0, 3.0);
        let mut opt = Adam::new(1e-3, 0.0);
        opt.step(&mut s);
        // Bias-corrected m/sqrt(v) is sign(g) on the first step.
        assert!((s.value() - (1.0 - 1e-3)).abs() < 1e-9);
        assert_eq!(opt.steps_taken(), 1);
    }

    #[test]
    fn adam_weight_decay_pulls_towards_zero_without_gradient() {
        let mut s = Scalar::new(5.0, 0.0);
        let mut opt = OptimizerKind::Adam.build(1e-2, 1e-3);
        for _ in 0..10 {
            opt.step(&mut s);
        }
        assert!(s.value() < 5.0);
    }

    #[test]
    fn learning_rate_is_adjustable_through_the_trait() {
        let mut opt = OptimizerKind::Sgd.build(0.1, 0.0);
        opt.set_learning_rate(0.01);
        assert_eq!(opt.learning_rate(), 0.01);
    }
}

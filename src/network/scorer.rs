use crate::layers::param::Param;
use crate::math::matrix::Matrix;
use crate::network::mode::Mode;

/// A trainable function from a batch of signals to per-class scores.
///
/// The training harness only talks to this trait, so the block design of a
/// concrete network stays an implementation detail.
pub trait Scorer {
    fn n_classes(&self) -> usize;

    /// Maps `channels x length` signals to a `batch x n_classes` matrix of
    /// raw scores (logits). In `Mode::Training` the scorer caches what
    /// `backward` needs; in `Mode::Inference` it caches nothing.
    fn forward(&mut self, batch: Vec<Matrix>, mode: Mode) -> Matrix;

    /// Accumulates `∂L/∂θ` into every parameter's `grad`, given `∂L/∂scores`
    /// for the last `Training` forward pass.
    fn backward(&mut self, grad_scores: &Matrix);

    fn visit_params_mut(&mut self, f: &mut dyn FnMut(&mut Param));

    fn visit_params(&self, f: &mut dyn FnMut(&Param));

    fn zero_grad(&mut self) {
        self.visit_params_mut(&mut |p| p.zero_grad());
    }

    fn param_count(&self) -> usize {
        let mut n = 0;
        self.visit_params(&mut |p| n += p.numel());
        n
    }
}

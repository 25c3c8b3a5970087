use rand::Rng;

use crate::layers::param::Param;
use crate::math::matrix::Matrix;
use crate::network::mode::Mode;

/// Fully connected layer without activation: `y = x · W + b`.
///
/// Used as the classification head, so its output is the raw per-class
/// score vector (logits) for every sample in the batch.
#[derive(Debug)]
pub struct Dense {
    pub input_size: usize,
    pub size: usize,
    pub weights: Param, // input_size x size
    pub biases: Param,  // 1 x size
    input_cache: Option<Matrix>,
}

impl Dense {
    pub fn new<R: Rng + ?Sized>(input_size: usize, size: usize, rng: &mut R) -> Dense {
        Dense {
            input_size,
            size,
            weights: Param::new(Matrix::xavier(input_size, size, input_size, rng)),
            biases: Param::new(Matrix::zeros(1, size)),
            input_cache: None,
        }
    }

    /// `input` is `batch x input_size`; returns `batch x size`.
    pub fn forward(&mut self, input: Matrix, mode: Mode) -> Matrix {
        assert_eq!(input.cols, self.input_size, "Dense: input width mismatch");
        let mut out = input.matmul(&self.weights.value);
        for r in 0..out.rows {
            for (o, b) in out.row_mut(r).iter_mut().zip(&self.biases.value.data) {
                *o += b;
            }
        }
        self.input_cache = if mode.is_training() { Some(input) } else { None };
        out
    }

    /// Accumulates parameter gradients and returns `∂L/∂input`.
    ///
    /// `grad_out` is `∂L/∂y`, shape `batch x size`.
    pub fn backward(&mut self, grad_out: &Matrix) -> Matrix {
        let input = self
            .input_cache
            .take()
            .expect("Dense::backward called without a Training forward pass");

        let w_grad = input.transpose().matmul(grad_out);
        self.weights.grad.add_assign(&w_grad);

        for r in 0..grad_out.rows {
            for (g, d) in self.biases.grad.data.iter_mut().zip(grad_out.row(r)) {
                *g += d;
            }
        }

        grad_out.matmul(&self.weights.value.transpose())
    }

    pub fn params_mut(&mut self) -> [&mut Param; 2] {
        [&mut self.weights, &mut self.biases]
    }

    pub fn params(&self) -> [&Param; 2] {
        [&self.weights, &self.biases]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn forward_adds_bias_to_every_row() {
        let mut layer = Dense::new(2, 1, &mut StdRng::seed_from_u64(0));
        layer.weights.value = Matrix::from_rows(vec![vec![1.0], vec![2.0]]);
        layer.biases.value = Matrix::from_rows(vec![vec![0.5]]);
        let out = layer.forward(
            Matrix::from_rows(vec![vec![1.0, 1.0], vec![0.0, 2.0]]),
            Mode::Inference,
        );
        assert_eq!(out.data, vec![3.5, 4.5]);
    }

    #[test]
    fn backward_accumulates_weight_and_bias_gradients() {
        let mut layer = Dense::new(2, 1, &mut StdRng::seed_from_u64(0));
        layer.weights.value = Matrix::from_rows(vec![vec![1.0], vec![-1.0]]);
        let input = Matrix::from_rows(vec![vec![2.0, 3.0]]);
        layer.forward(input, Mode::Training);

        let grad_in = layer.backward(&Matrix::from_rows(vec![vec![1.0]]));
        assert_eq!(layer.weights.grad.data, vec![2.0, 3.0]);
        assert_eq!(layer.biases.grad.data, vec![1.0]);
        assert_eq!(grad_in.data, vec![1.0, -1.0]);
    }
}

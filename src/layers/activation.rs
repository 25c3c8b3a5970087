use crate::activation::activation::ActivationFunction;
use crate::math::matrix::Matrix;
use crate::network::mode::Mode;

/// Applies an `ActivationFunction` element-wise to every signal in a batch.
#[derive(Debug)]
pub struct Activation {
    pub function: ActivationFunction,
    pre_activation: Option<Vec<Matrix>>,
}

impl Activation {
    pub fn new(function: ActivationFunction) -> Activation {
        Activation { function, pre_activation: None }
    }

    pub fn forward(&mut self, batch: Vec<Matrix>, mode: Mode) -> Vec<Matrix> {
        let f = self.function;
        let out = batch.iter().map(|z| z.map(|x| f.function(x))).collect();
        self.pre_activation = if mode.is_training() { Some(batch) } else { None };
        out
    }

    /// δ = grad ⊙ σ'(z), using the cached pre-activation z.
    pub fn backward(&mut self, grad_out: Vec<Matrix>) -> Vec<Matrix> {
        let z = self
            .pre_activation
            .take()
            .expect("Activation::backward called without a Training forward pass");
        let f = self.function;
        z.iter()
            .zip(grad_out.iter())
            .map(|(z, g)| g.hadamard(&z.map(|x| f.derivative(x))))
            .collect()
    }
}

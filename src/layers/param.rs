use crate::math::matrix::Matrix;

/// A trainable tensor and the gradient accumulated for it since the last
/// `zero_grad`.
#[derive(Debug, Clone)]
pub struct Param {
    pub value: Matrix,
    pub grad: Matrix,
}

impl Param {
    pub fn new(value: Matrix) -> Param {
        let grad = Matrix::zeros(value.rows, value.cols);
        Param { value, grad }
    }

    pub fn zero_grad(&mut self) {
        self.grad.fill(0.0);
    }

    pub fn numel(&self) -> usize {
        self.value.len()
    }
}

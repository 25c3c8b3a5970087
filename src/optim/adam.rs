use crate::math::matrix::Matrix;
use crate::network::scorer::Scorer;
use crate::optim::Optimizer;

/// Adam with L2 weight decay folded into the gradient (not decoupled AdamW).
///
/// Moment buffers are created lazily on the first step, one pair per
/// parameter in the scorer's `visit_params_mut` order.
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub eps: f64,
    pub weight_decay: f64,
    t: i32,
    moments: Vec<(Matrix, Matrix)>,
}

impl Adam {
    pub fn new(learning_rate: f64, weight_decay: f64) -> Adam {
        Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            weight_decay,
            t: 0,
            moments: Vec::new(),
        }
    }

    pub fn steps_taken(&self) -> i32 {
        self.t
    }
}

impl Optimizer for Adam {
    fn step(&mut self, scorer: &mut dyn Scorer) {
        self.t += 1;
        let (b1, b2, eps, wd, lr) = (self.beta1, self.beta2, self.eps, self.weight_decay, self.learning_rate);
        let bias1 = 1.0 - b1.powi(self.t);
        let bias2 = 1.0 - b2.powi(self.t);

        let moments = &mut self.moments;
        let mut idx = 0;
        scorer.visit_params_mut(&mut |p| {
            if moments.len() == idx {
                moments.push((
                    Matrix::zeros(p.value.rows, p.value.cols),
                    Matrix::zeros(p.value.rows, p.value.cols),
                ));
            }
            let (m, v) = &mut moments[idx];
            for i in 0..p.value.data.len() {
                let g = p.grad.data[i] + wd * p.value.data[i];
                m.data[i] = b1 * m.data[i] + (1.0 - b1) * g;
                v.data[i] = b2 * v.data[i] + (1.0 - b2) * g * g;
                let m_hat = m.data[i] / bias1;
                let v_hat = v.data[i] / bias2;
                p.value.data[i] -= lr * m_hat / (v_hat.sqrt() + eps);
            }
            idx += 1;
        });
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.learning_rate = lr;
    }
}

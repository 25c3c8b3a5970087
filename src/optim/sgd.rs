use crate::network::scorer::Scorer;
use crate::optim::Optimizer;

/// Plain stochastic gradient descent with optional L2 weight decay.
pub struct Sgd {
    pub learning_rate: f64,
    pub weight_decay: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64, weight_decay: f64) -> Sgd {
        Sgd { learning_rate, weight_decay }
    }
}

impl Optimizer for Sgd {
    /// θ ← θ − lr · (∇θ + wd · θ)
    fn step(&mut self, scorer: &mut dyn Scorer) {
        let lr = self.learning_rate;
        let wd = self.weight_decay;
        scorer.visit_params_mut(&mut |p| {
            for (w, g) in p.value.data.iter_mut().zip(&p.grad.data) {
                *w -= lr * (g + wd * *w);
            }
        });
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.learning_rate = lr;
    }
}

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::math::matrix::Matrix;
use crate::network::mode::Mode;

/// Inverted dropout: in `Training` mode every element is zeroed with
/// probability `rate` and survivors are scaled by `1 / (1 - rate)`;
/// in `Inference` mode the layer is the identity.
#[derive(Debug)]
pub struct Dropout {
    pub rate: f64,
    rng: StdRng,
    masks: Option<Vec<Matrix>>,
}

impl Dropout {
    pub fn new(rate: f64, seed: u64) -> Dropout {
        assert!((0.0..1.0).contains(&rate), "Dropout: rate must be in [0, 1)");
        Dropout {
            rate,
            rng: StdRng::seed_from_u64(seed),
            masks: None,
        }
    }

    pub fn forward(&mut self, batch: Vec<Matrix>, mode: Mode) -> Vec<Matrix> {
        if !mode.is_training() || self.rate == 0.0 {
            self.masks = None;
            return batch;
        }

        let keep = 1.0 - self.rate;
        let scale = 1.0 / keep;
        let masks: Vec<Matrix> = batch
            .iter()
            .map(|x| {
                let data = (0..x.len())
                    .map(|_| if self.rng.gen::<f64>() < keep { scale } else { 0.0 })
                    .collect();
                Matrix::from_vec(x.rows, x.cols, data)
            })
            .collect();

        let out = batch.iter().zip(&masks).map(|(x, m)| x.hadamard(m)).collect();
        self.masks = Some(masks);
        out
    }

    pub fn backward(&mut self, grad_out: Vec<Matrix>) -> Vec<Matrix> {
        match self.masks.take() {
            Some(masks) => grad_out.iter().zip(&masks).map(|(g, m)| g.hadamard(m)).collect(),
            // rate == 0: forward was the identity.
            None => grad_out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_mode_is_identity() {
        let mut d = Dropout::new(0.5, 0);
        let x = Matrix::from_rows(vec![vec![1.0, 2.0, 3.0]]);
        let y = d.forward(vec![x.clone()], Mode::Inference);
        assert_eq!(y[0], x);
    }

    #[test]
    fn training_mode_zeroes_or_rescales() {
        let mut d = Dropout::new(0.5, 42);
        let x = Matrix::from_vec(1, 200, vec![1.0; 200]);
        let y = d.forward(vec![x], Mode::Training);
        assert!(y[0].data.iter().all(|&v| v == 0.0 || v == 2.0));
        assert!(y[0].data.iter().any(|&v| v == 0.0));
        assert!(y[0].data.iter().any(|&v| v == 2.0));

        let g = d.backward(vec![Matrix::from_vec(1, 200, vec![1.0; 200])]);
        assert_eq!(g[0], y[0]);
    }
}

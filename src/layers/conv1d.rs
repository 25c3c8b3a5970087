use rand::Rng;

use crate::layers::param::Param;
use crate::math::matrix::Matrix;
use crate::network::mode::Mode;

/// Padding needed so that the output length is `ceil(len / stride)`.
///
/// Returns `(left, right)`; when the total is odd the extra column goes to
/// the right.
pub fn same_padding(len: usize, kernel_size: usize, stride: usize) -> (usize, usize) {
    let out_len = len.div_ceil(stride);
    let needed = ((out_len.max(1) - 1) * stride + kernel_size).saturating_sub(len);
    let left = needed / 2;
    (left, needed - left)
}

/// 1-D convolution over `channels x length` signals with "same" padding.
///
/// Weights are stored as `out_channels x (in_channels * kernel_size)`, the
/// column for input channel `c` and tap `k` being `c * kernel_size + k`.
#[derive(Debug)]
pub struct Conv1d {
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel_size: usize,
    pub stride: usize,
    pub weights: Param,
    pub biases: Param, // out_channels x 1
    input_cache: Option<Vec<Matrix>>,
}

impl Conv1d {
    pub fn new<R: Rng + ?Sized>(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        rng: &mut R,
    ) -> Conv1d {
        assert!(kernel_size > 0 && stride > 0, "Conv1d: kernel_size and stride must be positive");
        let fan_in = in_channels * kernel_size;
        Conv1d {
            in_channels,
            out_channels,
            kernel_size,
            stride,
            weights: Param::new(Matrix::he(out_channels, fan_in, fan_in, rng)),
            biases: Param::new(Matrix::zeros(out_channels, 1)),
            input_cache: None,
        }
    }

    pub fn output_len(&self, len: usize) -> usize {
        len.div_ceil(self.stride)
    }

    pub fn forward(&mut self, batch: Vec<Matrix>, mode: Mode) -> Vec<Matrix> {
        let out = batch.iter().map(|x| self.forward_one(x)).collect();
        self.input_cache = if mode.is_training() { Some(batch) } else { None };
        out
    }

    fn forward_one(&self, x: &Matrix) -> Matrix {
        assert_eq!(x.rows, self.in_channels, "Conv1d: channel mismatch");
        let len = x.cols;
        let out_len = self.output_len(len);
        let (pad_left, _) = same_padding(len, self.kernel_size, self.stride);
        let k = self.kernel_size;

        let mut y = Matrix::zeros(self.out_channels, out_len);
        for o in 0..self.out_channels {
            let w_row = self.weights.value.row(o);
            let bias = self.biases.value.data[o];
            for t in 0..out_len {
                let start = (t * self.stride) as isize - pad_left as isize;
                let mut acc = bias;
                for c in 0..self.in_channels {
                    let x_row = x.row(c);
                    let w_c = &w_row[c * k..(c + 1) * k];
                    for (tap, w) in w_c.iter().enumerate() {
                        let pos = start + tap as isize;
                        if pos >= 0 && (pos as usize) < len {
                            acc += w * x_row[pos as usize];
                        }
                    }
                }
                y[(o, t)] = acc;
            }
        }
        y
    }

    /// Accumulates parameter gradients and returns `∂L/∂input` per sample.
    pub fn backward(&mut self, grad_out: Vec<Matrix>) -> Vec<Matrix> {
        let inputs = self
            .input_cache
            .take()
            .expect("Conv1d::backward called without a Training forward pass");
        assert_eq!(inputs.len(), grad_out.len(), "Conv1d: batch size mismatch in backward");

        inputs
            .iter()
            .zip(grad_out.iter())
            .map(|(x, dy)| self.backward_one(x, dy))
            .collect()
    }

    fn backward_one(&mut self, x: &Matrix, dy: &Matrix) -> Matrix {
        let len = x.cols;
        let (pad_left, _) = same_padding(len, self.kernel_size, self.stride);
        let k = self.kernel_size;
        let mut dx = Matrix::zeros(self.in_channels, len);

        for o in 0..self.out_channels {
            let dy_row = dy.row(o);
            self.biases.grad.data[o] += dy_row.iter().sum::<f64>();
            for (t, &g) in dy_row.iter().enumerate() {
                if g == 0.0 {
                    continue;
                }
                let start = (t * self.stride) as isize - pad_left as isize;
                for c in 0..self.in_channels {
                    for tap in 0..k {
                        let pos = start + tap as isize;
                        if pos < 0 || pos as usize >= len {
                            continue;
                        }
                        let pos = pos as usize;
                        let col = c * k + tap;
                        self.weights.grad[(o, col)] += g * x[(c, pos)];
                        dx[(c, pos)] += g * self.weights.value[(o, col)];
                    }
                }
            }
        }
        dx
    }

    pub fn params_mut(&mut self) -> [&mut Param; 2] {
        [&mut self.weights, &mut self.biases]
    }

    pub fn params(&self) -> [&Param; 2] {
        [&self.weights, &self.biases]
    }
}

use crate::math::matrix::Matrix;
use crate::network::mode::Mode;

/// Max pooling with `stride == kernel_size` and zero "same" padding, so the
/// output length is `ceil(len / kernel_size)` and matches a strided
/// convolution on the main path of a residual block.
#[derive(Debug)]
pub struct MaxPool1d {
    pub kernel_size: usize,
    // Per sample, per output cell: index of the winning input column, or
    // `None` when a padding zero won.
    argmax: Option<Vec<(usize, Vec<Option<usize>>)>>,
}

impl MaxPool1d {
    pub fn new(kernel_size: usize) -> MaxPool1d {
        assert!(kernel_size > 0, "MaxPool1d: kernel_size must be positive");
        MaxPool1d { kernel_size, argmax: None }
    }

    pub fn forward(&mut self, batch: Vec<Matrix>, mode: Mode) -> Vec<Matrix> {
        let k = self.kernel_size;
        let mut winners = Vec::with_capacity(batch.len());
        let out = batch
            .iter()
            .map(|x| {
                let len = x.cols;
                let pad = k - 1;
                let pad_left = pad / 2;
                let out_len = len.div_ceil(k);
                let mut y = Matrix::zeros(x.rows, out_len);
                let mut idx = Vec::with_capacity(x.rows * out_len);
                for c in 0..x.rows {
                    let row = x.row(c);
                    for t in 0..out_len {
                        let start = (t * k) as isize - pad_left as isize;
                        let mut best = f64::NEG_INFINITY;
                        let mut best_idx = None;
                        for tap in 0..k {
                            let pos = start + tap as isize;
                            let (value, at) = if pos >= 0 && (pos as usize) < len {
                                (row[pos as usize], Some(pos as usize))
                            } else {
                                (0.0, None)
                            };
                            if value > best {
                                best = value;
                                best_idx = at;
                            }
                        }
                        y[(c, t)] = best;
                        idx.push(best_idx);
                    }
                }
                winners.push((len, idx));
                y
            })
            .collect();
        self.argmax = if mode.is_training() { Some(winners) } else { None };
        out
    }

    /// Routes each output gradient back to the input column that won the max.
    pub fn backward(&mut self, grad_out: Vec<Matrix>) -> Vec<Matrix> {
        let winners = self
            .argmax
            .take()
            .expect("MaxPool1d::backward called without a Training forward pass");
        grad_out
            .iter()
            .zip(winners)
            .map(|(g, (len, idx))| {
                let mut dx = Matrix::zeros(g.rows, len);
                for c in 0..g.rows {
                    for t in 0..g.cols {
                        if let Some(pos) = idx[c * g.cols + t] {
                            dx[(c, pos)] += g[(c, t)];
                        }
                    }
                }
                dx
            })
            .collect()
    }
}

/// Zero-pads the channel axis from `in_channels` to `out_channels`, splitting
/// the new channels evenly before and after the existing ones.
pub fn pad_channels(x: &Matrix, out_channels: usize) -> Matrix {
    let extra = out_channels - x.rows;
    let before = extra / 2;
    let mut y = Matrix::zeros(out_channels, x.cols);
    for c in 0..x.rows {
        y.row_mut(c + before).copy_from_slice(x.row(c));
    }
    y
}

/// Inverse of `pad_channels` for gradients: keeps only the original channels.
pub fn crop_channels(g: &Matrix, in_channels: usize) -> Matrix {
    let before = (g.rows - in_channels) / 2;
    let mut y = Matrix::zeros(in_channels, g.cols);
    for c in 0..in_channels {
        y.row_mut(c).copy_from_slice(g.row(c + before));
    }
    y
}

/// Mean over the length axis: `channels x length` → one feature per channel.
/// A batch becomes a `batch x channels` matrix ready for the dense head.
#[derive(Debug, Default)]
pub struct GlobalAvgPool {
    lengths: Option<Vec<usize>>,
}

impl GlobalAvgPool {
    pub fn new() -> GlobalAvgPool {
        GlobalAvgPool::default()
    }

    pub fn forward(&mut self, batch: Vec<Matrix>, mode: Mode) -> Matrix {
        let rows: Vec<Vec<f64>> = batch.iter().map(|x| x.row_means()).collect();
        self.lengths = if mode.is_training() {
            Some(batch.iter().map(|x| x.cols).collect())
        } else {
            None
        };
        Matrix::from_rows(rows)
    }

    pub fn backward(&mut self, grad_out: &Matrix) -> Vec<Matrix> {
        let lengths = self
            .lengths
            .take()
            .expect("GlobalAvgPool::backward called without a Training forward pass");
        lengths
            .iter()
            .enumerate()
            .map(|(i, &len)| {
                let channels = grad_out.cols;
                let mut dx = Matrix::zeros(channels, len);
                for c in 0..channels {
                    let share = grad_out[(i, c)] / len.max(1) as f64;
                    dx.row_mut(c).iter_mut().for_each(|v| *v = share);
                }
                dx
            })
            .collect()
    }
}

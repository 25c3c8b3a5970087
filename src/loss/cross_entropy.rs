use crate::math::matrix::Matrix;

/// Categorical cross-entropy over raw scores (logits) and integer targets.
///
/// Softmax is applied inside the loss, so the scorer's last layer is linear.
pub struct CrossEntropyLoss;

impl CrossEntropyLoss {
    /// Softmax of one score vector, shifted by its max for stability.
    pub fn softmax(logits: &[f64]) -> Vec<f64> {
        let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
        let sum: f64 = exps.iter().sum();
        exps.into_iter().map(|e| e / sum).collect()
    }

    /// Loss of one sample: `logsumexp(z) - z[target]`.
    pub fn loss(logits: &[f64], target: usize) -> f64 {
        let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let lse = max + logits.iter().map(|z| (z - max).exp()).sum::<f64>().ln();
        lse - logits[target]
    }

    /// Mean loss over a batch and its gradient w.r.t. the logits.
    ///
    /// `logits` is `batch x n_classes`. The gradient of the mean is
    /// `(softmax(z) - one_hot(target)) / batch` for every row.
    pub fn forward_backward(logits: &Matrix, targets: &[usize]) -> (f64, Matrix) {
        assert_eq!(
            logits.rows,
            targets.len(),
            "CrossEntropyLoss: {} score rows for {} targets",
            logits.rows,
            targets.len()
        );
        let n = logits.rows.max(1) as f64;
        let mut grad = Matrix::zeros(logits.rows, logits.cols);
        let mut total = 0.0;

        for (r, &target) in targets.iter().enumerate() {
            let row = logits.row(r);
            total += Self::loss(row, target);
            let probs = Self::softmax(row);
            for (c, (g, p)) in grad.row_mut(r).iter_mut().zip(probs).enumerate() {
                let y = if c == target { 1.0 } else { 0.0 };
                *g = (p - y) / n;
            }
        }

        (total / n, grad)
    }

    /// Mean loss over a batch without computing a gradient.
    pub fn mean(logits: &Matrix, targets: &[usize]) -> f64 {
        if targets.is_empty() {
            return 0.0;
        }
        targets
            .iter()
            .enumerate()
            .map(|(r, &t)| Self::loss(logits.row(r), t))
            .sum::<f64>()
            / targets.len() as f64
    }
}

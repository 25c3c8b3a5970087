use std::fmt;

use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// `n_classes x n_classes` count matrix; entry `(t, p)` counts samples whose
/// true class is `t` and predicted class is `p`. Every class has a row and a
/// column even when it never occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub n_classes: usize,
    counts: Vec<usize>,
}

impl ConfusionMatrix {
    pub fn from_labels(truth: &[usize], predicted: &[usize], n_classes: usize) -> Result<ConfusionMatrix> {
        if truth.len() != predicted.len() {
            return Err(Error::LengthMismatch {
                what: "predictions",
                expected: truth.len(),
                actual: predicted.len(),
            });
        }
        let mut counts = vec![0usize; n_classes * n_classes];
        for (&t, &p) in truth.iter().zip(predicted) {
            for label in [t, p] {
                if label >= n_classes {
                    return Err(Error::LabelOutOfRange { label, n_classes });
                }
            }
            counts[t * n_classes + p] += 1;
        }
        Ok(ConfusionMatrix { n_classes, counts })
    }

    pub fn get(&self, truth: usize, predicted: usize) -> usize {
        self.counts[truth * self.n_classes + predicted]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn true_positives(&self, class: usize) -> usize {
        self.get(class, class)
    }

    /// Column sum: everything predicted as `class`.
    pub fn predicted_count(&self, class: usize) -> usize {
        (0..self.n_classes).map(|t| self.get(t, class)).sum()
    }

    /// Row sum: everything whose true class is `class`.
    pub fn support(&self, class: usize) -> usize {
        (0..self.n_classes).map(|p| self.get(class, p)).sum()
    }

    pub fn rows(&self) -> Vec<Vec<usize>> {
        self.counts.chunks(self.n_classes.max(1)).map(|r| r.to_vec()).collect()
    }
}

impl fmt::Display for ConfusionMatrix {
    /// Rows are true classes, columns predicted classes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .counts
            .iter()
            .map(|c| c.to_string().len())
            .max()
            .unwrap_or(1)
            .max(3);
        write!(f, "{:>4}", "")?;
        for p in 0..self.n_classes {
            write!(f, " {:>width$}", format!("P{p}"))?;
        }
        for t in 0..self.n_classes {
            writeln!(f)?;
            write!(f, "{:>4}", format!("T{t}"))?;
            for p in 0..self.n_classes {
                write!(f, " {:>width$}", self.get(t, p))?;
            }
        }
        Ok(())
    }
}

/// Precision, recall and F1 of one class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class metrics over a fixed class set plus their macro average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub per_class: Vec<ClassMetrics>,
    /// Unweighted mean of per-class F1 over every class in the set.
    pub macro_f1: f64,
    pub accuracy: f64,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

impl ClassificationReport {
    /// Any zero denominator (class never predicted, never present, or both)
    /// yields 0 for that quantity.
    pub fn from_confusion(cm: &ConfusionMatrix) -> ClassificationReport {
        let per_class: Vec<ClassMetrics> = (0..cm.n_classes)
            .map(|c| {
                let tp = cm.true_positives(c);
                let precision = ratio(tp, cm.predicted_count(c));
                let recall = ratio(tp, cm.support(c));
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics { precision, recall, f1, support: cm.support(c) }
            })
            .collect();

        let macro_f1 = if per_class.is_empty() {
            0.0
        } else {
            per_class.iter().map(|m| m.f1).sum::<f64>() / per_class.len() as f64
        };
        let correct: usize = (0..cm.n_classes).map(|c| cm.true_positives(c)).sum();

        ClassificationReport {
            per_class,
            macro_f1,
            accuracy: ratio(correct, cm.total()),
        }
    }

    pub fn f1(&self, class: usize) -> f64 {
        self.per_class[class].f1
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>5} {:>9} {:>9} {:>9} {:>7}", "class", "precision", "recall", "f1", "support")?;
        for (c, m) in self.per_class.iter().enumerate() {
            write!(
                f,
                "\n{:>5} {:>9.4} {:>9.4} {:>9.4} {:>7}",
                c, m.precision, m.recall, m.f1, m.support
            )?;
        }
        write!(f, "\nmacro f1 {:.4}  accuracy {:.4}", self.macro_f1, self.accuracy)
    }
}

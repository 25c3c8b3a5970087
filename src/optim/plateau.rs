use log::{info, warn};
use serde::{Serialize, Deserialize};

use crate::optim::Optimizer;

/// Settings for `ReduceLrOnPlateau` (mode "min", relative threshold).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateauConfig {
    /// Multiplier applied to the learning rate on a plateau.
    pub factor: f64,
    /// Non-improving epochs tolerated before reducing.
    pub patience: usize,
    /// Relative improvement required: `metric < best * (1 - threshold)`.
    pub threshold: f64,
    /// Epochs to wait after a reduction before counting bad epochs again.
    pub cooldown: usize,
    pub min_lr: f64,
    /// Reductions smaller than this are skipped.
    pub eps: f64,
}

impl Default for PlateauConfig {
    fn default() -> Self {
        PlateauConfig {
            factor: 0.1,
            patience: 10,
            threshold: 1e-4,
            cooldown: 0,
            min_lr: 0.0,
            eps: 1e-8,
        }
    }
}

/// Multiplies the optimizer's learning rate by `factor` once a monitored
/// metric (lower is better) has not improved for more than `patience` epochs.
#[derive(Debug, Clone)]
pub struct ReduceLrOnPlateau {
    pub config: PlateauConfig,
    best: f64,
    num_bad_epochs: usize,
    cooldown_counter: usize,
}

impl ReduceLrOnPlateau {
    pub fn new(config: PlateauConfig) -> ReduceLrOnPlateau {
        ReduceLrOnPlateau {
            config,
            best: f64::INFINITY,
            num_bad_epochs: 0,
            cooldown_counter: 0,
        }
    }

    pub fn best(&self) -> f64 {
        self.best
    }

    pub fn num_bad_epochs(&self) -> usize {
        self.num_bad_epochs
    }

    fn is_better(&self, metric: f64) -> bool {
        metric < self.best * (1.0 - self.config.threshold)
    }

    /// Feeds one epoch's metric. Returns the new learning rate when it was
    /// reduced. Non-finite metrics are skipped and leave the state untouched.
    pub fn step(&mut self, metric: f64, optimizer: &mut dyn Optimizer) -> Option<f64> {
        if !metric.is_finite() {
            warn!("plateau scheduler: metric {metric} is not finite; skipping update");
            return None;
        }

        if self.is_better(metric) {
            self.best = metric;
            self.num_bad_epochs = 0;
        } else {
            self.num_bad_epochs += 1;
        }

        if self.cooldown_counter > 0 {
            self.cooldown_counter -= 1;
            self.num_bad_epochs = 0;
        }

        if self.num_bad_epochs <= self.config.patience {
            return None;
        }

        self.cooldown_counter = self.config.cooldown;
        self.num_bad_epochs = 0;

        let old_lr = optimizer.learning_rate();
        let new_lr = (old_lr * self.config.factor).max(self.config.min_lr);
        if old_lr - new_lr > self.config.eps {
            optimizer.set_learning_rate(new_lr);
            info!(
                "plateau: learning rate {old_lr:.3e} -> {new_lr:.3e} (best={:.6}, cur={metric:.6})",
                self.best
            );
            Some(new_lr)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::sgd::Sgd;

    fn scheduler(patience: usize) -> ReduceLrOnPlateau {
        ReduceLrOnPlateau::new(PlateauConfig { patience, ..PlateauConfig::default() })
    }

    #[test]
    fn reduces_after_patience_plus_one_bad_epochs() {
        let mut sched = scheduler(2);
        let mut opt = Sgd::new(1e-3, 0.0);

        assert_eq!(sched.step(1.0, &mut opt), None); // new best
        assert_eq!(sched.step(1.0, &mut opt), None); // bad 1
        assert_eq!(sched.step(1.0, &mut opt), None); // bad 2
        let reduced = sched.step(1.0, &mut opt); // bad 3 > patience
        assert!((reduced.unwrap() - 1e-4).abs() < 1e-15);
        assert!((opt.learning_rate() - 1e-4).abs() < 1e-15);
        assert_eq!(sched.num_bad_epochs(), 0);
    }

    #[test]
    fn improvement_resets_the_counter() {
        let mut sched = scheduler(1);
        let mut opt = Sgd::new(1.0, 0.0);
        sched.step(1.0, &mut opt);
        sched.step(1.0, &mut opt);
        assert_eq!(sched.num_bad_epochs(), 1);
        sched.step(0.5, &mut opt);
        assert_eq!(sched.num_bad_epochs(), 0);
        assert_eq!(opt.learning_rate(), 1.0);
    }

    #[test]
    fn tiny_improvements_below_threshold_count_as_bad() {
        let mut sched = scheduler(10);
        let mut opt = Sgd::new(1.0, 0.0);
        sched.step(1.0, &mut opt);
        sched.step(1.0 - 1e-6, &mut opt);
        assert_eq!(sched.num_bad_epochs(), 1);
        assert_eq!(sched.best(), 1.0);
    }

    #[test]
    fn non_finite_metrics_are_ignored() {
        let mut sched = scheduler(0);
        let mut opt = Sgd::new(1.0, 0.0);
        sched.step(1.0, &mut opt);
        assert_eq!(sched.step(f64::NAN, &mut opt), None);
        assert_eq!(sched.step(f64::INFINITY, &mut opt), None);
        assert_eq!(sched.num_bad_epochs(), 0);
        assert_eq!(opt.learning_rate(), 1.0);
    }

    #[test]
    fn min_lr_floors_the_reduction() {
        let mut sched = ReduceLrOnPlateau::new(PlateauConfig {
            patience: 0,
            min_lr: 0.5,
            ..PlateauConfig::default()
        });
        let mut opt = Sgd::new(1.0, 0.0);
        sched.step(1.0, &mut opt);
        assert_eq!(sched.step(1.0, &mut opt), Some(0.5));
        // Already at the floor: nothing left to reduce.
        assert_eq!(sched.step(1.0, &mut opt), None);
    }
}

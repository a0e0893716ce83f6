//! Learning Rate Scheduling
//!
//! Epoch-level learning rate schedules. Training uses cosine annealing over
//! a fixed cycle length; the constant and warmup variants are kept for
//! experiments.

use serde::{Deserialize, Serialize};

/// Learning rate scheduler that adjusts the learning rate during training
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LrScheduler {
    /// Constant learning rate (no scheduling)
    Constant { lr: f64 },

    /// Smooth decay following a cosine curve over a fixed cycle length
    CosineAnnealing {
        initial_lr: f64,
        min_lr: f64,
        cycle_epochs: usize,
    },

    /// Linear warmup followed by cosine annealing
    WarmupCosine {
        initial_lr: f64,
        min_lr: f64,
        warmup_epochs: usize,
        cycle_epochs: usize,
    },
}

impl LrScheduler {
    /// Create a constant learning rate scheduler
    pub fn constant(lr: f64) -> Self {
        Self::Constant { lr }
    }

    /// Create a cosine annealing scheduler
    pub fn cosine_annealing(initial_lr: f64, min_lr: f64, cycle_epochs: usize) -> Self {
        Self::CosineAnnealing {
            initial_lr,
            min_lr,
            cycle_epochs,
        }
    }

    /// Get the learning rate for a given epoch
    pub fn get_lr(&self, epoch: usize) -> f64 {
        match self {
            Self::Constant { lr } => *lr,

            Self::CosineAnnealing {
                initial_lr,
                min_lr,
                cycle_epochs,
            } => {
                let progress = epoch as f64 / *cycle_epochs as f64;
                let cosine_factor = (1.0 + (std::f64::consts::PI * progress).cos()) / 2.0;
                min_lr + (initial_lr - min_lr) * cosine_factor
            }

            Self::WarmupCosine {
                initial_lr,
                min_lr,
                warmup_epochs,
                cycle_epochs,
            } => {
                if epoch < *warmup_epochs {
                    let progress = (epoch as f64 + 1.0) / (*warmup_epochs as f64);
                    initial_lr * progress
                } else {
                    let progress = (epoch - warmup_epochs) as f64 / *cycle_epochs as f64;
                    let cosine_factor = (1.0 + (std::f64::consts::PI * progress).cos()) / 2.0;
                    min_lr + (initial_lr - min_lr) * cosine_factor
                }
            }
        }
    }

    /// Get a description of the scheduler
    pub fn description(&self) -> String {
        match self {
            Self::Constant { lr } => format!("Constant LR: {:.6}", lr),
            Self::CosineAnnealing {
                initial_lr,
                min_lr,
                cycle_epochs,
            } => format!(
                "Cosine Annealing: initial={:.6}, min={:.6}, cycle={}",
                initial_lr, min_lr, cycle_epochs
            ),
            Self::WarmupCosine {
                initial_lr,
                warmup_epochs,
                cycle_epochs,
                ..
            } => format!(
                "Warmup + Cosine: initial={:.6}, warmup={}, cycle={}",
                initial_lr, warmup_epochs, cycle_epochs
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_scheduler() {
        let scheduler = LrScheduler::constant(0.001);
        assert_eq!(scheduler.get_lr(0), 0.001);
        assert_eq!(scheduler.get_lr(50), 0.001);
    }

    #[test]
    fn test_cosine_annealing_endpoints() {
        let scheduler = LrScheduler::cosine_annealing(0.1, 0.001, 10);

        // Starts at the initial rate and reaches the minimum at the end of
        // the cycle.
        assert!((scheduler.get_lr(0) - 0.1).abs() < 1e-12);
        assert!((scheduler.get_lr(10) - 0.001).abs() < 1e-12);

        // Midpoint of the cycle sits halfway between the two.
        let mid = scheduler.get_lr(5);
        assert!((mid - (0.1 + 0.001) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_annealing_is_monotone_within_cycle() {
        let scheduler = LrScheduler::cosine_annealing(1e-3, 0.0, 10);
        for epoch in 0..10 {
            assert!(scheduler.get_lr(epoch) > scheduler.get_lr(epoch + 1));
        }
    }

    #[test]
    fn test_warmup_cosine_ramps_up_first() {
        let scheduler = LrScheduler::WarmupCosine {
            initial_lr: 0.1,
            min_lr: 0.001,
            warmup_epochs: 5,
            cycle_epochs: 20,
        };

        for epoch in 0..4 {
            assert!(scheduler.get_lr(epoch) < scheduler.get_lr(epoch + 1));
        }
        assert!(scheduler.get_lr(5) <= 0.1);
    }
}

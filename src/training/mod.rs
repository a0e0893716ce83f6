//! Training module
//!
//! This module provides:
//! - Masked cross-entropy loss for segmentation with ignored pixels
//! - Learning rate scheduling (cosine annealing)
//! - The supervised training/validation loop on Burn's autodiff backends

pub mod loss;
pub mod scheduler;
pub mod supervised;

pub use loss::masked_cross_entropy;
pub use scheduler::LrScheduler;
pub use supervised::run_training;

/// Cycle length of the cosine annealing schedule, in epochs
pub const COSINE_CYCLE_EPOCHS: usize = 10;

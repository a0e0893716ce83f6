//! Run Configuration
//!
//! A single immutable hyperparameter record covering the dataset paths, the
//! model shape knobs and the optimization settings. The record is built once
//! at process start (from the CLI) and passed by value into each component;
//! there is no process-wide mutable configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::utils::error::{KittiSegError, Result};

/// Immutable hyperparameters for one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hyperparameters {
    /// Root directory of the KITTI dataset (containing imagesTr/ and labelsTs/)
    pub data_path: PathBuf,

    /// Batch size for training and validation
    pub batch_size: usize,

    /// Initial learning rate
    pub lr: f64,

    /// Number of U-Net encoder levels
    pub num_layers: usize,

    /// Number of feature channels in the first encoder level
    pub features_start: usize,

    /// Use bilinear upsampling instead of transposed convolutions
    pub bilinear: bool,

    /// Number of batches to accumulate gradients over before stepping
    pub grad_batches: usize,

    /// Number of training epochs
    pub epochs: usize,

    /// Target resolution (width, height) for images and masks
    pub img_size: (u32, u32),

    /// Seed for the train/validation split and epoch shuffling
    pub seed: u64,

    /// Directory for checkpoints and the metrics history
    pub output_dir: PathBuf,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data_semantics"),
            batch_size: 2,
            lr: 1e-3,
            num_layers: 5,
            features_start: 64,
            bilinear: false,
            grad_batches: 1,
            epochs: 20,
            img_size: crate::DEFAULT_IMG_SIZE,
            seed: crate::SPLIT_SEED,
            output_dir: PathBuf::from("output/models"),
        }
    }
}

impl Hyperparameters {
    /// Validate the record. Configuration errors are fatal at startup, so
    /// this runs before any dataset or model work begins.
    pub fn validate(&self) -> Result<()> {
        if !self.data_path.exists() {
            return Err(KittiSegError::PathNotFound(self.data_path.clone()));
        }
        if self.batch_size == 0 {
            return Err(KittiSegError::Config("batch_size must be > 0".to_string()));
        }
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(KittiSegError::Config(format!(
                "lr must be a positive finite number, got {}",
                self.lr
            )));
        }
        if self.num_layers < 2 {
            return Err(KittiSegError::Config(
                "num_layers must be at least 2".to_string(),
            ));
        }
        if self.features_start == 0 {
            return Err(KittiSegError::Config(
                "features_start must be > 0".to_string(),
            ));
        }
        if self.grad_batches == 0 {
            return Err(KittiSegError::Config(
                "grad_batches must be > 0".to_string(),
            ));
        }
        if self.img_size.0 == 0 || self.img_size.1 == 0 {
            return Err(KittiSegError::Config(
                "img_size dimensions must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

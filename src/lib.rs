//! # KITTI Semantic Segmentation
//!
//! A Rust training pipeline for U-Net semantic segmentation on the KITTI
//! driving dataset, built on the Burn framework.
//!
//! ## Modules
//!
//! - `dataset`: label remapping, file discovery, deterministic train/valid
//!   splitting, sample loading and batching
//! - `model`: the U-Net architecture built with Burn
//! - `training`: masked cross-entropy loss, learning rate scheduling and the
//!   training loop
//! - `utils`: logging, metrics and error types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kitti_seg::backend::TrainingBackend;
//! use kitti_seg::config::Hyperparameters;
//! use kitti_seg::training::supervised::run_training;
//!
//! let params = Hyperparameters::default();
//! run_training::<TrainingBackend>(&params)?;
//! ```

pub mod backend;
pub mod config;
pub mod dataset;
pub mod model;
pub mod training;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::Hyperparameters;
pub use dataset::batcher::{KittiBatcher, KittiDataset, SegBatch};
pub use dataset::index::{split_indices, KittiIndex, Split};
pub use dataset::labels::LabelSpace;
pub use dataset::loader::{Normalizer, SampleLoader, SegItem};
pub use model::unet::{UNet, UNetConfig};
pub use training::loss::masked_cross_entropy;
pub use training::scheduler::LrScheduler;
pub use utils::error::{KittiSegError, Result};

/// Number of dense training classes in the KITTI label space
pub const NUM_CLASSES: usize = 19;

/// Sentinel label for pixels excluded from the loss
pub const IGNORE_INDEX: i64 = 250;

/// Default target resolution (width, height) for images and masks
pub const DEFAULT_IMG_SIZE: (u32, u32) = (1242, 376);

/// Fixed seed for the reproducible train/validation split
pub const SPLIT_SEED: u64 = 12345;

/// Fraction of samples held out for validation
pub const VALID_FRACTION: f64 = 0.2;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Dataset module
//!
//! This module covers the whole data path from disk to Burn tensors:
//! - `labels`: remapping raw KITTI semantic IDs to a dense training range
//! - `index`: file discovery and the deterministic train/valid split
//! - `loader`: decoding, resizing and remapping one sample
//! - `batcher`: Burn `Dataset` and `Batcher` implementations

pub mod batcher;
pub mod index;
pub mod labels;
pub mod loader;

pub use batcher::{KittiBatcher, KittiDataset, SegBatch};
pub use index::{split_indices, KittiIndex, Split};
pub use labels::LabelSpace;
pub use loader::{Normalizer, SampleLoader, SegItem};

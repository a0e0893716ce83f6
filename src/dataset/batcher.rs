//! Burn Dataset Integration
//!
//! Implements Burn's `Dataset` trait over the indexed image/mask pairs and a
//! `Batcher` that assembles loaded samples into training tensors. Batching
//! order, worker scheduling and device transfer belong to Burn's dataloader;
//! everything here is stateless per call.

use std::path::Path;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;

use crate::dataset::index::{KittiIndex, Split};
use crate::dataset::loader::{SampleLoader, SegItem};
use crate::utils::error::Result;
use crate::VALID_FRACTION;

/// One side of the KITTI train/valid split, loading samples lazily.
#[derive(Debug, Clone)]
pub struct KittiDataset {
    samples: Vec<(std::path::PathBuf, std::path::PathBuf)>,
    loader: SampleLoader,
}

impl KittiDataset {
    /// Index `root` and keep the requested side of the deterministic split.
    pub fn new(root: &Path, split: Split, loader: SampleLoader, seed: u64) -> Result<Self> {
        let index = KittiIndex::discover(root)?;
        let samples = index.select(split, seed, VALID_FRACTION);
        Ok(Self { samples, loader })
    }

    /// Build a dataset from explicit path pairs (used by tests and tools)
    pub fn from_pairs(
        samples: Vec<(std::path::PathBuf, std::path::PathBuf)>,
        loader: SampleLoader,
    ) -> Self {
        Self { samples, loader }
    }

    /// The loader used for this dataset
    pub fn loader(&self) -> &SampleLoader {
        &self.loader
    }

    /// Eagerly load every sample, surfacing the first data error.
    ///
    /// Running this before training makes unreadable files a startup error
    /// instead of a mid-epoch abort.
    pub fn preload(&self) -> Result<Vec<SegItem>> {
        self.samples
            .iter()
            .map(|(img, mask)| self.loader.load(img, mask))
            .collect()
    }
}

impl Dataset<SegItem> for KittiDataset {
    fn get(&self, index: usize) -> Option<SegItem> {
        let (img, mask) = self.samples.get(index)?;
        // A failed load aborts the run. Skipping the sample instead would
        // silently change the reproducible split.
        match self.loader.load(img, mask) {
            Ok(item) => Some(item),
            Err(err) => panic!("aborting: failed to load sample {}: {}", index, err),
        }
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// A batch of segmentation samples
#[derive(Clone, Debug)]
pub struct SegBatch<B: Backend> {
    /// Images with shape `[batch_size, 3, height, width]`
    pub images: Tensor<B, 4>,
    /// Training labels with shape `[batch_size, height, width]`
    pub masks: Tensor<B, 3, Int>,
}

/// Batcher turning loaded samples into `SegBatch` tensors
#[derive(Clone, Debug)]
pub struct KittiBatcher {
    width: usize,
    height: usize,
}

impl KittiBatcher {
    /// Create a batcher for the given (width, height) resolution
    pub fn new(img_size: (u32, u32)) -> Self {
        Self {
            width: img_size.0 as usize,
            height: img_size.1 as usize,
        }
    }
}

impl<B: Backend> Batcher<B, SegItem, SegBatch<B>> for KittiBatcher {
    fn batch(&self, items: Vec<SegItem>, device: &B::Device) -> SegBatch<B> {
        let batch_size = items.len();
        let (height, width) = (self.height, self.width);

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.clone()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, 3, height, width]),
            device,
        );

        let masks_data: Vec<i64> = items.iter().flat_map(|item| item.mask.clone()).collect();
        let masks = Tensor::<B, 3, Int>::from_data(
            TensorData::new(masks_data, [batch_size, height, width]),
            device,
        );

        SegBatch { images, masks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    fn synthetic_item(w: usize, h: usize, label: i64) -> SegItem {
        SegItem {
            image: vec![0.5f32; 3 * h * w],
            mask: vec![label; h * w],
            path: "synthetic.png".to_string(),
        }
    }

    #[test]
    fn test_batch_shapes() {
        let device = Default::default();
        let batcher = KittiBatcher::new((8, 4));

        let items = vec![synthetic_item(8, 4, 3), synthetic_item(8, 4, 7)];
        let batch: SegBatch<TestBackend> = batcher.batch(items, &device);

        assert_eq!(batch.images.dims(), [2, 3, 4, 8]);
        assert_eq!(batch.masks.dims(), [2, 4, 8]);
    }

    #[test]
    fn test_batch_preserves_mask_values() {
        let device = Default::default();
        let batcher = KittiBatcher::new((2, 2));

        let items = vec![synthetic_item(2, 2, crate::IGNORE_INDEX)];
        let batch: SegBatch<TestBackend> = batcher.batch(items, &device);

        let values: Vec<i64> = batch.masks.into_data().to_vec().unwrap();
        assert_eq!(values, vec![crate::IGNORE_INDEX; 4]);
    }
}

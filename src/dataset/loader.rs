//! Sample Loading
//!
//! Turns one image/mask path pair into a training sample: decode, resize to
//! the configured resolution, remap the mask labels and normalize the image.
//! The loader is stateless per call, so data-loader workers can share one
//! instance and pull samples concurrently.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::ImageReader;
use serde::{Deserialize, Serialize};

use crate::dataset::labels::LabelSpace;
use crate::utils::error::{KittiSegError, Result};

/// KITTI per-channel mean used for input normalization
pub const KITTI_MEAN: [f32; 3] = [0.356_759_76, 0.373_801_89, 0.376_475_3];

/// KITTI per-channel standard deviation used for input normalization
pub const KITTI_STD: [f32; 3] = [0.320_649_45, 0.320_988_66, 0.323_253_24];

/// Per-channel normalization applied to images after the [0, 1] scaling.
///
/// The transform is supplied by the caller; the loader does not fix it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Normalizer {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Normalizer {
    /// The KITTI training statistics
    pub fn kitti() -> Self {
        Self {
            mean: KITTI_MEAN,
            std: KITTI_STD,
        }
    }

    /// Identity transform (leaves the [0, 1] scaling untouched)
    pub fn identity() -> Self {
        Self {
            mean: [0.0; 3],
            std: [1.0; 3],
        }
    }

    /// Normalize a CHW image buffer in place
    pub fn apply_chw(&self, image: &mut [f32], pixels_per_channel: usize) {
        for c in 0..3 {
            let mean = self.mean[c];
            let std = self.std[c];
            for px in &mut image[c * pixels_per_channel..(c + 1) * pixels_per_channel] {
                *px = (*px - mean) / std;
            }
        }
    }
}

/// A single sample ready for batching
#[derive(Debug, Clone)]
pub struct SegItem {
    /// Normalized image as a flattened CHW float array `[3 * H * W]`
    pub image: Vec<f32>,
    /// Training labels as a flattened HW array `[H * W]`, row-major
    pub mask: Vec<i64>,
    /// Image path (for debugging/logging)
    pub path: String,
}

/// Loads image/mask pairs at a fixed resolution.
///
/// Images are resized with a triangle filter; masks are resized with
/// nearest-neighbor so no interpolated, non-existent class IDs are invented.
#[derive(Debug, Clone)]
pub struct SampleLoader {
    img_size: (u32, u32),
    labels: LabelSpace,
    normalizer: Normalizer,
}

impl SampleLoader {
    /// Create a loader for the given resolution, label space and
    /// caller-supplied normalization transform
    pub fn new(img_size: (u32, u32), labels: LabelSpace, normalizer: Normalizer) -> Self {
        Self {
            img_size,
            labels,
            normalizer,
        }
    }

    /// The target (width, height)
    pub fn img_size(&self) -> (u32, u32) {
        self.img_size
    }

    /// The label space used for mask remapping
    pub fn labels(&self) -> &LabelSpace {
        &self.labels
    }

    /// Load and preprocess one sample.
    ///
    /// The returned image and mask always have the configured resolution
    /// regardless of the source file's native size, and the mask only holds
    /// dense class indices or the ignore sentinel.
    pub fn load(&self, image_path: &Path, mask_path: &Path) -> Result<SegItem> {
        let (width, height) = (self.img_size.0, self.img_size.1);

        let img = ImageReader::open(image_path)
            .map_err(|e| image_load_error(image_path, &e.to_string()))?
            .decode()
            .map_err(|e| image_load_error(image_path, &e.to_string()))?
            .resize_exact(width, height, FilterType::Triangle)
            .to_rgb8();

        let (w, h) = (width as usize, height as usize);
        let mut image = vec![0.0f32; 3 * h * w];

        // CHW layout, scaled to [0, 1]
        for y in 0..h {
            for x in 0..w {
                let pixel = img.get_pixel(x as u32, y as u32);
                image[y * w + x] = pixel[0] as f32 / 255.0;
                image[h * w + y * w + x] = pixel[1] as f32 / 255.0;
                image[2 * h * w + y * w + x] = pixel[2] as f32 / 255.0;
            }
        }
        self.normalizer.apply_chw(&mut image, h * w);

        // Masks must use nearest-neighbor: any interpolating filter would
        // blend neighboring class IDs into values that name no class at all.
        let mask_img = ImageReader::open(mask_path)
            .map_err(|e| image_load_error(mask_path, &e.to_string()))?
            .decode()
            .map_err(|e| image_load_error(mask_path, &e.to_string()))?
            .resize_exact(width, height, FilterType::Nearest)
            .to_luma8();

        let mut mask: Vec<i64> = mask_img.pixels().map(|p| p[0] as i64).collect();
        self.labels.encode_mask(&mut mask);

        Ok(SegItem {
            image,
            mask,
            path: image_path.to_string_lossy().to_string(),
        })
    }
}

fn image_load_error(path: &Path, msg: &str) -> KittiSegError {
    KittiSegError::ImageLoad(PathBuf::from(path), msg.to_string())
}

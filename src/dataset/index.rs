//! Dataset Indexing and Splitting
//!
//! Discovers image/mask file pairs under a KITTI dataset root and partitions
//! them into train and validation subsets. The split is a pure function of
//! the file count and a fixed seed, so every run (and every parallel data
//! worker) sees exactly the same partition.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::utils::error::{KittiSegError, Result};

/// Subdirectory holding the input images
pub const IMAGES_SUBDIR: &str = "imagesTr";

/// Subdirectory holding the ground-truth masks
pub const MASKS_SUBDIR: &str = "labelsTs";

/// Which half of the split a dataset instance serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Valid,
}

/// Ordered image and mask path lists for one dataset root.
///
/// The i-th image corresponds to the i-th mask; both lists are sorted with a
/// natural (human) ordering so numeric suffixes pair up correctly.
#[derive(Debug, Clone)]
pub struct KittiIndex {
    pub image_paths: Vec<PathBuf>,
    pub mask_paths: Vec<PathBuf>,
}

impl KittiIndex {
    /// Discover the image/mask pairs under `root`.
    ///
    /// Fails if either subdirectory is missing or if the two directories
    /// disagree on the number of files; a silent truncation here would pair
    /// images with the wrong masks.
    pub fn discover(root: &Path) -> Result<Self> {
        let image_dir = root.join(IMAGES_SUBDIR);
        let mask_dir = root.join(MASKS_SUBDIR);

        let image_paths = list_natural_sorted(&image_dir)?;
        let mask_paths = list_natural_sorted(&mask_dir)?;

        if image_paths.len() != mask_paths.len() {
            return Err(KittiSegError::CountMismatch {
                images: image_paths.len(),
                masks: mask_paths.len(),
            });
        }
        if image_paths.is_empty() {
            return Err(KittiSegError::Dataset(format!(
                "no samples found under {}",
                root.display()
            )));
        }

        info!(
            "Indexed {} image/mask pairs under {}",
            image_paths.len(),
            root.display()
        );

        Ok(Self {
            image_paths,
            mask_paths,
        })
    }

    /// Number of sample pairs
    pub fn len(&self) -> usize {
        self.image_paths.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.image_paths.is_empty()
    }

    /// Resolve the path pairs belonging to one side of the split
    pub fn select(&self, split: Split, seed: u64, holdout_fraction: f64) -> Vec<(PathBuf, PathBuf)> {
        let (train_idx, valid_idx) = split_indices(self.len(), seed, holdout_fraction);
        let indices = match split {
            Split::Train => train_idx,
            Split::Valid => valid_idx,
        };
        debug!("Split {:?}: {} samples", split, indices.len());

        indices
            .into_iter()
            .map(|i| (self.image_paths[i].clone(), self.mask_paths[i].clone()))
            .collect()
    }
}

/// List the files of `dir` in natural (human) order.
///
/// Natural ordering sorts numeric suffixes numerically, so `img2` comes
/// before `img10`.
fn list_natural_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(KittiSegError::PathNotFound(dir.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .collect();

    paths.sort_by(|a, b| {
        let a = a.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let b = b.file_name().and_then(|n| n.to_str()).unwrap_or("");
        natord::compare(a, b)
    });

    Ok(paths)
}

/// Deterministically partition `[0, n)` into train and validation indices.
///
/// Draws `floor(n * holdout_fraction)` validation indices without
/// replacement from a `ChaCha8Rng` seeded with `seed`; the remaining indices
/// form the training set. Both halves are returned in ascending order. The
/// result depends only on `(n, seed, holdout_fraction)`, never on any other
/// random state in the process.
pub fn split_indices(n: usize, seed: u64, holdout_fraction: f64) -> (Vec<usize>, Vec<usize>) {
    let n_valid = (n as f64 * holdout_fraction).floor() as usize;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut valid_idx: Vec<usize> = rand::seq::index::sample(&mut rng, n, n_valid).into_vec();
    valid_idx.sort_unstable();

    let mut in_valid = vec![false; n];
    for &i in &valid_idx {
        in_valid[i] = true;
    }
    let train_idx: Vec<usize> = (0..n).filter(|&i| !in_valid[i]).collect();

    (train_idx, valid_idx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    #[test]
    fn test_split_sizes_and_reproducibility() {
        let (train1, valid1) = split_indices(100, 12345, 0.2);
        let (train2, valid2) = split_indices(100, 12345, 0.2);

        assert_eq!(valid1.len(), 20);
        assert_eq!(train1.len(), 80);
        assert_eq!(train1, train2);
        assert_eq!(valid1, valid2);
    }

    #[test]
    fn test_split_disjoint_and_complete() {
        let n = 97;
        let (train, valid) = split_indices(n, 12345, 0.2);

        let train_set: HashSet<usize> = train.iter().copied().collect();
        let valid_set: HashSet<usize> = valid.iter().copied().collect();

        assert!(train_set.is_disjoint(&valid_set));
        assert_eq!(train_set.len() + valid_set.len(), n);
        assert!(train_set.union(&valid_set).all(|&i| i < n));
        // floor(97 / 5) = 19
        assert_eq!(valid.len(), 19);
    }

    #[test]
    fn test_split_differs_across_seeds() {
        let (_, valid_a) = split_indices(100, 12345, 0.2);
        let (_, valid_b) = split_indices(100, 54321, 0.2);
        assert_ne!(valid_a, valid_b);
    }

    #[test]
    fn test_split_empty_dataset() {
        let (train, valid) = split_indices(0, 12345, 0.2);
        assert!(train.is_empty());
        assert!(valid.is_empty());
    }

    #[test]
    fn test_discover_natural_order_and_pairing() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join(IMAGES_SUBDIR)).unwrap();
        fs::create_dir_all(root.join(MASKS_SUBDIR)).unwrap();

        for name in ["img10.png", "img2.png", "img1.png"] {
            fs::write(root.join(IMAGES_SUBDIR).join(name), b"x").unwrap();
            fs::write(root.join(MASKS_SUBDIR).join(name), b"x").unwrap();
        }

        let index = KittiIndex::discover(root).unwrap();
        let names: Vec<_> = index
            .image_paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        // Numeric suffixes sort numerically, not lexically.
        assert_eq!(names, vec!["img1.png", "img2.png", "img10.png"]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_discover_count_mismatch() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join(IMAGES_SUBDIR)).unwrap();
        fs::create_dir_all(root.join(MASKS_SUBDIR)).unwrap();

        fs::write(root.join(IMAGES_SUBDIR).join("a.png"), b"x").unwrap();
        fs::write(root.join(IMAGES_SUBDIR).join("b.png"), b"x").unwrap();
        fs::write(root.join(MASKS_SUBDIR).join("a.png"), b"x").unwrap();

        let result = KittiIndex::discover(root);
        assert!(matches!(
            result,
            Err(KittiSegError::CountMismatch {
                images: 2,
                masks: 1
            })
        ));
    }

    #[test]
    fn test_discover_missing_dir() {
        let temp = tempfile::tempdir().unwrap();
        let result = KittiIndex::discover(temp.path());
        assert!(matches!(result, Err(KittiSegError::PathNotFound(_))));
    }

    #[test]
    fn test_select_pairs_follow_split() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join(IMAGES_SUBDIR)).unwrap();
        fs::create_dir_all(root.join(MASKS_SUBDIR)).unwrap();
        for i in 0..10 {
            let name = format!("img{}.png", i);
            fs::write(root.join(IMAGES_SUBDIR).join(&name), b"x").unwrap();
            fs::write(root.join(MASKS_SUBDIR).join(&name), b"x").unwrap();
        }

        let index = KittiIndex::discover(root).unwrap();
        let train = index.select(Split::Train, 12345, 0.2);
        let valid = index.select(Split::Valid, 12345, 0.2);

        assert_eq!(train.len(), 8);
        assert_eq!(valid.len(), 2);
        for (img, mask) in train.iter().chain(valid.iter()) {
            assert_eq!(img.file_name(), mask.file_name());
        }
    }
}

//! KITTI Label Remapping
//!
//! Raw KITTI semantic masks use the full Cityscapes-style label IDs. Only 19
//! of those classes are trained on; the rest (sky markers, rectification
//! borders, ...) are void and must not contribute to the loss. `LabelSpace`
//! maps the raw IDs onto a dense `[0, K)` range and sends everything else to
//! the ignore sentinel.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::utils::error::{KittiSegError, Result};
use crate::IGNORE_INDEX;

/// Raw KITTI IDs that are never trained on
pub const DEFAULT_VOID_LABELS: [i64; 16] = [0, 1, 2, 3, 4, 5, 6, 9, 10, 14, 15, 16, 18, 29, 30, -1];

/// Raw KITTI IDs kept for training; position determines the dense class index
pub const DEFAULT_VALID_LABELS: [i64; 19] = [
    7, 8, 11, 12, 13, 17, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 31, 32, 33,
];

/// A fixed bijection from a subset of raw semantic IDs to a dense `[0, K)`
/// training range.
///
/// Remapping is a total function: every input value ends up either at its
/// dense class index or at the ignore sentinel, including stray IDs that
/// belong to neither set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelSpace {
    void_labels: Vec<i64>,
    valid_labels: Vec<i64>,
    class_map: HashMap<i64, i64>,
    ignore_index: i64,
}

impl LabelSpace {
    /// Build a label space from explicit void/valid sets.
    ///
    /// The two sets must be disjoint, and the dense range must stay clear of
    /// the ignore sentinel. Checking this here removes the pass-ordering
    /// hazard the per-ID rewrite approach would otherwise carry.
    pub fn new(void_labels: &[i64], valid_labels: &[i64]) -> Result<Self> {
        if let Some(dup) = valid_labels.iter().find(|v| void_labels.contains(v)) {
            return Err(KittiSegError::LabelSpace(format!(
                "label {} appears in both the void and valid sets",
                dup
            )));
        }

        let mut class_map = HashMap::with_capacity(valid_labels.len());
        for (dense, &raw) in valid_labels.iter().enumerate() {
            if class_map.insert(raw, dense as i64).is_some() {
                return Err(KittiSegError::LabelSpace(format!(
                    "duplicate valid label {}",
                    raw
                )));
            }
        }

        if valid_labels.len() as i64 > IGNORE_INDEX {
            return Err(KittiSegError::LabelSpace(format!(
                "{} classes would collide with the ignore index {}",
                valid_labels.len(),
                IGNORE_INDEX
            )));
        }

        Ok(Self {
            void_labels: void_labels.to_vec(),
            valid_labels: valid_labels.to_vec(),
            class_map,
            ignore_index: IGNORE_INDEX,
        })
    }

    /// The default KITTI label space with 19 training classes
    pub fn kitti() -> Self {
        // The default sets are disjoint by construction.
        Self::new(&DEFAULT_VOID_LABELS, &DEFAULT_VALID_LABELS)
            .expect("default KITTI label sets are disjoint")
    }

    /// Number of dense training classes K
    pub fn num_classes(&self) -> usize {
        self.valid_labels.len()
    }

    /// The sentinel value for ignored pixels
    pub fn ignore_index(&self) -> i64 {
        self.ignore_index
    }

    /// The ordered valid raw IDs
    pub fn valid_labels(&self) -> &[i64] {
        &self.valid_labels
    }

    /// The void raw IDs
    pub fn void_labels(&self) -> &[i64] {
        &self.void_labels
    }

    /// Map one raw label ID to its training label
    #[inline]
    pub fn encode_pixel(&self, raw: i64) -> i64 {
        match self.class_map.get(&raw) {
            Some(&dense) => dense,
            None => self.ignore_index,
        }
    }

    /// Remap a raw mask in place.
    ///
    /// Valid IDs become their dense class index; void IDs and any stray,
    /// unmapped value become the ignore sentinel.
    pub fn encode_mask(&self, mask: &mut [i64]) {
        for px in mask.iter_mut() {
            *px = self.encode_pixel(*px);
        }
    }
}

impl Default for LabelSpace {
    fn default() -> Self {
        Self::kitti()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kitti_mapping() {
        let labels = LabelSpace::kitti();
        assert_eq!(labels.num_classes(), 19);

        // First valid label maps to class 0, third to class 2.
        assert_eq!(labels.encode_pixel(7), 0);
        assert_eq!(labels.encode_pixel(8), 1);
        assert_eq!(labels.encode_pixel(11), 2);
        assert_eq!(labels.encode_pixel(33), 18);

        // Void labels map to the ignore sentinel.
        assert_eq!(labels.encode_pixel(2), IGNORE_INDEX);
        assert_eq!(labels.encode_pixel(-1), IGNORE_INDEX);
    }

    #[test]
    fn test_encode_is_total() {
        let labels = LabelSpace::kitti();
        let mut mask: Vec<i64> = vec![-500, -1, 0, 7, 18, 33, 34, 100, 250, 9999];
        labels.encode_mask(&mut mask);

        for &px in &mask {
            assert!(
                (0..labels.num_classes() as i64).contains(&px) || px == IGNORE_INDEX,
                "pixel {} escaped the training label range",
                px
            );
        }
    }

    #[test]
    fn test_encode_idempotent_with_fixed_point_classes() {
        // Idempotence holds when dense indices are fixed points of the
        // mapping, i.e. valid label i sits at dense index i.
        let labels = LabelSpace::new(&[100, 101], &[0, 1, 2, 3]).unwrap();

        let mut mask: Vec<i64> = vec![0, 1, 2, 3, 100, 101, 77];
        labels.encode_mask(&mut mask);
        let once = mask.clone();
        labels.encode_mask(&mut mask);

        assert_eq!(mask, once);
        assert_eq!(once, vec![0, 1, 2, 3, IGNORE_INDEX, IGNORE_INDEX, IGNORE_INDEX]);
    }

    #[test]
    fn test_overlapping_sets_rejected() {
        let result = LabelSpace::new(&[1, 2, 3], &[3, 4, 5]);
        assert!(matches!(result, Err(KittiSegError::LabelSpace(_))));
    }

    #[test]
    fn test_duplicate_valid_labels_rejected() {
        let result = LabelSpace::new(&[], &[4, 5, 4]);
        assert!(matches!(result, Err(KittiSegError::LabelSpace(_))));
    }
}

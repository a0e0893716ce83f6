//! Masked Cross-Entropy Loss
//!
//! Per-pixel classification loss that excludes ignored pixels entirely: they
//! contribute neither loss mass nor gradient, and a batch consisting only of
//! ignored pixels yields a loss of exactly zero.

use burn::prelude::*;
use burn::tensor::activation::log_softmax;

/// Compute the mean cross-entropy over all pixels not marked `ignore_index`.
///
/// # Arguments
/// * `logits` - Per-pixel class scores of shape `[batch, classes, height, width]`
/// * `targets` - Training labels of shape `[batch, height, width]`
/// * `ignore_index` - Sentinel value excluded from the loss
pub fn masked_cross_entropy<B: Backend>(
    logits: Tensor<B, 4>,
    targets: Tensor<B, 3, Int>,
    ignore_index: i64,
) -> Tensor<B, 1> {
    let [batch, classes, height, width] = logits.dims();
    let n = batch * height * width;

    // [B, C, H, W] -> [N, C] with the class axis last
    let logits = logits.permute([0, 2, 3, 1]).reshape([n, classes]);
    let targets = targets.reshape([n]);

    let ignored = targets.clone().equal_elem(ignore_index);
    let valid = ignored.clone().bool_not().float();

    // Ignored targets are clamped to class 0 so the gather stays in bounds;
    // their contribution is zeroed by the mask afterwards.
    let safe_targets = targets.mask_fill(ignored, 0);

    let log_probs = log_softmax(logits, 1);
    let picked: Tensor<B, 1> = log_probs
        .gather(1, safe_targets.unsqueeze_dim::<2>(1))
        .squeeze::<1>(1);

    let total = (picked * valid.clone()).sum().neg();
    let count = valid.sum().clamp_min(1.0);
    total / count
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    use crate::IGNORE_INDEX;

    type TestBackend = NdArray;

    fn logits_from(data: Vec<f32>, shape: [usize; 4]) -> Tensor<TestBackend, 4> {
        Tensor::from_floats(TensorData::new(data, shape), &Default::default())
    }

    fn targets_from(data: Vec<i64>, shape: [usize; 3]) -> Tensor<TestBackend, 3, Int> {
        Tensor::from_data(TensorData::new(data, shape), &Default::default())
    }

    #[test]
    fn test_all_ignored_yields_exactly_zero() {
        let logits = logits_from(vec![3.0, -1.0, 0.5, 2.0, 7.0, -4.0], [1, 3, 1, 2]);
        let targets = targets_from(vec![IGNORE_INDEX, IGNORE_INDEX], [1, 1, 2]);

        let loss: f32 = masked_cross_entropy(logits, targets, IGNORE_INDEX)
            .into_scalar();
        assert_eq!(loss, 0.0);
    }

    #[test]
    fn test_uniform_logits_give_log_num_classes() {
        let classes = 4;
        let logits = logits_from(vec![0.0; classes], [1, classes, 1, 1]);
        let targets = targets_from(vec![2], [1, 1, 1]);

        let loss: f32 = masked_cross_entropy(logits, targets, IGNORE_INDEX).into_scalar();
        assert!((loss - (classes as f32).ln()).abs() < 1e-5);
    }

    #[test]
    fn test_ignored_pixels_do_not_shift_the_mean() {
        // One valid pixel with uniform logits, one ignored pixel with
        // extreme logits. The ignored pixel must not move the loss.
        let logits = logits_from(vec![0.0, 100.0, 0.0, -100.0], [1, 2, 1, 2]);
        let targets = targets_from(vec![0, IGNORE_INDEX], [1, 1, 2]);

        let loss: f32 = masked_cross_entropy(logits, targets, IGNORE_INDEX).into_scalar();
        assert!((loss - 2.0f32.ln()).abs() < 1e-5);
    }

    #[test]
    fn test_confident_correct_prediction_has_small_loss() {
        let logits = logits_from(vec![10.0, -10.0], [1, 2, 1, 1]);
        let targets = targets_from(vec![0], [1, 1, 1]);

        let loss: f32 = masked_cross_entropy(logits, targets, IGNORE_INDEX).into_scalar();
        assert!(loss < 1e-3);
    }
}

//! Supervised Training Loop
//!
//! A custom training loop on Burn's API: epoch shuffling with a seeded RNG,
//! gradient accumulation, masked cross-entropy, cosine-annealed Adam and
//! checkpointing with the compact recorder. Validation runs on the inner
//! (non-autodiff) backend and never updates parameters.

use anyhow::Result;
use burn::{
    data::dataloader::batcher::Batcher,
    data::dataset::Dataset,
    module::{AutodiffModule, Module},
    optim::{AdamConfig, GradientsAccumulator, GradientsParams, Optimizer},
    record::CompactRecorder,
    tensor::{backend::AutodiffBackend, backend::Backend, ElementConversion},
};
use chrono::Local;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::Hyperparameters;
use crate::dataset::batcher::{KittiBatcher, KittiDataset, SegBatch};
use crate::dataset::index::Split;
use crate::dataset::labels::LabelSpace;
use crate::dataset::loader::{Normalizer, SampleLoader};
use crate::model::unet::{UNet, UNetConfig};
use crate::training::loss::masked_cross_entropy;
use crate::training::scheduler::LrScheduler;
use crate::training::COSINE_CYCLE_EPOCHS;
use crate::utils::logging::MetricsHistory;
use crate::{IGNORE_INDEX, NUM_CLASSES};

/// Run supervised training with the given hyperparameters.
///
/// # Type Parameters
/// * `B` - The autodiff backend to use (e.g. `Autodiff<NdArray>` or `Autodiff<Cuda>`)
pub fn run_training<B>(params: &Hyperparameters) -> Result<()>
where
    B: AutodiffBackend,
{
    params.validate()?;
    std::fs::create_dir_all(&params.output_dir)?;

    let device = B::Device::default();
    info!("Device: {:?}", device);

    // Data pipeline: one loader shared by both splits, KITTI normalization.
    let labels = LabelSpace::kitti();
    let loader = SampleLoader::new(params.img_size, labels, Normalizer::kitti());
    let train_dataset = KittiDataset::new(&params.data_path, Split::Train, loader.clone(), params.seed)?;
    let valid_dataset = KittiDataset::new(&params.data_path, Split::Valid, loader, params.seed)?;
    info!(
        "Dataset: {} train / {} validation samples",
        train_dataset.len(),
        valid_dataset.len()
    );

    let batcher = KittiBatcher::new(params.img_size);

    // Model
    let model_config = UNetConfig::new()
        .with_num_classes(NUM_CLASSES)
        .with_num_layers(params.num_layers)
        .with_features_start(params.features_start)
        .with_bilinear(params.bilinear);
    let mut model = model_config.init::<B>(&device);

    // Optimizer: Adam with a cosine-annealed learning rate over a fixed
    // 10-epoch cycle.
    let mut optimizer = AdamConfig::new().init();
    let scheduler = LrScheduler::cosine_annealing(params.lr, 0.0, COSINE_CYCLE_EPOCHS);
    info!("Scheduler: {}", scheduler.description());

    let mut history = MetricsHistory::new();
    let mut epoch_rng = ChaCha8Rng::seed_from_u64(params.seed);

    for epoch in 0..params.epochs {
        let lr = scheduler.get_lr(epoch);
        info!("Epoch {}/{} (lr = {:.6})", epoch + 1, params.epochs, lr);

        let mut indices: Vec<usize> = (0..train_dataset.len()).collect();
        indices.shuffle(&mut epoch_rng);

        let mut accumulator = GradientsAccumulator::new();
        let mut accumulated = 0usize;
        let mut epoch_loss = 0.0f64;
        let mut num_batches = 0usize;

        for batch_indices in indices.chunks(params.batch_size) {
            let items: Vec<_> = batch_indices
                .iter()
                .filter_map(|&i| train_dataset.get(i))
                .collect();
            if items.is_empty() {
                continue;
            }

            let batch: SegBatch<B> = batcher.batch(items, &device);
            let output = model.forward(batch.images);
            let loss = masked_cross_entropy(output, batch.masks, IGNORE_INDEX);

            let loss_value: f64 = loss.clone().into_scalar().elem();
            epoch_loss += loss_value;
            num_batches += 1;
            debug!(train_loss = loss_value, batch = num_batches, "train step");

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            accumulator.accumulate(&model, grads);
            accumulated += 1;

            if accumulated >= params.grad_batches {
                model = optimizer.step(lr, model, accumulator.grads());
                accumulated = 0;
            }
        }

        // Flush a partial accumulation window at the epoch boundary.
        if accumulated > 0 {
            model = optimizer.step(lr, model, accumulator.grads());
        }

        let train_loss = epoch_loss / num_batches.max(1) as f64;
        let val_loss = evaluate(&model, &valid_dataset, &batcher, params.batch_size);
        history.record(epoch, train_loss, val_loss, lr);
    }

    if let Some(best) = history.best_val_loss() {
        info!("Best validation loss: {:.4}", best);
    }

    // Persist the metrics history and the trained model.
    history.save(&params.output_dir.join("metrics.json"))?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let checkpoint_path = params.output_dir.join(format!("kitti_unet_{}", timestamp));
    model
        .save_file(&checkpoint_path, &CompactRecorder::new())
        .map_err(|e| anyhow::anyhow!("Failed to save model: {:?}", e))?;
    info!("Saved checkpoint to {:?}", checkpoint_path);

    Ok(())
}

/// Compute the average validation loss on the inner (non-autodiff) backend.
fn evaluate<B: AutodiffBackend>(
    model: &UNet<B>,
    dataset: &KittiDataset,
    batcher: &KittiBatcher,
    batch_size: usize,
) -> f64 {
    let device = <B::InnerBackend as Backend>::Device::default();
    let inner_model = model.clone().valid();

    let len = dataset.len();
    let mut total = 0.0f64;
    let mut num_batches = 0usize;

    for start in (0..len).step_by(batch_size) {
        let end = (start + batch_size).min(len);
        let items: Vec<_> = (start..end).filter_map(|i| dataset.get(i)).collect();
        if items.is_empty() {
            continue;
        }

        let batch: SegBatch<B::InnerBackend> = batcher.batch(items, &device);
        let output = inner_model.forward(batch.images);
        let loss = masked_cross_entropy(output, batch.masks, IGNORE_INDEX);

        let loss_value: f64 = loss.into_scalar().elem();
        total += loss_value;
        num_batches += 1;
    }

    total / num_batches.max(1) as f64
}

//! KITTI Semantic Segmentation CLI
//!
//! Entry point for training and inspecting the KITTI semantic segmentation
//! pipeline built on the Burn framework.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use kitti_seg::backend::{backend_name, TrainingBackend};
use kitti_seg::config::Hyperparameters;
use kitti_seg::dataset::index::{KittiIndex, Split};
use kitti_seg::utils::logging::{init_logging, LogConfig};
use kitti_seg::{SPLIT_SEED, VALID_FRACTION};

/// KITTI Semantic Segmentation with U-Net
#[derive(Parser, Debug)]
#[command(name = "kitti_seg")]
#[command(version = kitti_seg::VERSION)]
#[command(about = "Semantic segmentation on the KITTI benchmark with Burn", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train the U-Net on a KITTI semantics directory
    Train {
        /// Path to the dataset root (containing imagesTr/ and labelsTs/)
        #[arg(short, long, default_value = "data_semantics")]
        data_path: PathBuf,

        /// Number of training epochs
        #[arg(short, long, default_value = "20")]
        epochs: usize,

        /// Batch size for training and validation
        #[arg(short, long, default_value = "2")]
        batch_size: usize,

        /// Initial learning rate
        #[arg(short, long, default_value = "0.001")]
        learning_rate: f64,

        /// Number of U-Net encoder levels
        #[arg(long, default_value = "5")]
        num_layers: usize,

        /// Feature channels in the first encoder level
        #[arg(long, default_value = "64")]
        features_start: usize,

        /// Use bilinear upsampling instead of transposed convolutions
        #[arg(long, default_value = "false")]
        bilinear: bool,

        /// Number of batches to accumulate gradients over before stepping
        #[arg(long, default_value = "1")]
        grad_batches: usize,

        /// Target image width in pixels
        #[arg(long, default_value = "1242")]
        img_width: u32,

        /// Target image height in pixels
        #[arg(long, default_value = "376")]
        img_height: u32,

        /// Seed for the train/validation split and epoch shuffling
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Output directory for checkpoints and metrics
        #[arg(short, long, default_value = "output/models")]
        output_dir: PathBuf,
    },

    /// Show dataset and split statistics
    Stats {
        /// Path to the dataset root (containing imagesTr/ and labelsTs/)
        #[arg(short, long, default_value = "data_semantics")]
        data_path: PathBuf,

        /// Seed for the train/validation split
        #[arg(long, default_value = "12345")]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let _ = init_logging(&log_config);

    print_banner();

    match cli.command {
        Commands::Train {
            data_path,
            epochs,
            batch_size,
            learning_rate,
            num_layers,
            features_start,
            bilinear,
            grad_batches,
            img_width,
            img_height,
            seed,
            output_dir,
        } => {
            let params = Hyperparameters {
                data_path,
                batch_size,
                lr: learning_rate,
                num_layers,
                features_start,
                bilinear,
                grad_batches,
                epochs,
                img_size: (img_width, img_height),
                seed,
                output_dir,
            };

            println!("{}", "Training Configuration:".cyan().bold());
            println!("  Data:        {}", params.data_path.display());
            println!("  Epochs:      {}", params.epochs);
            println!("  Batch size:  {}", params.batch_size);
            println!("  LR:          {}", params.lr);
            println!(
                "  U-Net:       {} layers, {} start features, bilinear={}",
                params.num_layers, params.features_start, params.bilinear
            );
            println!(
                "  Resolution:  {}x{}",
                params.img_size.0, params.img_size.1
            );
            println!("  Seed:        {}", params.seed);
            println!("  Backend:     {}", backend_name());
            println!();

            kitti_seg::training::run_training::<TrainingBackend>(&params)?;

            println!();
            println!("{}", "Training complete!".green().bold());
        }

        Commands::Stats { data_path, seed } => {
            cmd_stats(&data_path, seed)?;
        }
    }

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        r#"
 ============================================================
   KITTI Semantic Segmentation
   U-Net Training with Burn + Rust
 ============================================================
"#
        .green()
    );
}

fn cmd_stats(data_path: &std::path::Path, seed: u64) -> Result<()> {
    info!("Computing dataset statistics for: {}", data_path.display());

    let index = match KittiIndex::discover(data_path) {
        Ok(index) => index,
        Err(e) => {
            println!("{} Failed to index dataset: {}", "Error:".red(), e);
            return Ok(());
        }
    };

    let train = index.select(Split::Train, seed, VALID_FRACTION);
    let valid = index.select(Split::Valid, seed, VALID_FRACTION);

    println!("{}", "Dataset Statistics:".cyan().bold());
    println!("  Total samples:      {}", index.len());
    println!(
        "  Training samples:   {} ({:.1}%)",
        train.len(),
        100.0 * train.len() as f64 / index.len() as f64
    );
    println!(
        "  Validation samples: {} ({:.1}%)",
        valid.len(),
        100.0 * valid.len() as f64 / index.len() as f64
    );
    println!("  Split seed:         {}", seed);
    if seed == SPLIT_SEED {
        println!("  (reference split)");
    }

    Ok(())
}

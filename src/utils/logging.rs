//! Logging Module
//!
//! Structured logging via the `tracing` crate, plus the scalar metrics sink:
//! per-epoch `train_loss` / `val_loss` values are logged and appended to a
//! JSON history file so a run can be inspected after the fact.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::utils::error::{KittiSegError, Result};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to display
    pub level: Level,
    /// Whether to include target (module path)
    pub include_target: bool,
    /// Whether to use ANSI colors
    pub ansi_colors: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            include_target: false,
            ansi_colors: true,
        }
    }
}

impl LogConfig {
    /// Verbose config for debugging
    pub fn verbose() -> Self {
        Self {
            level: Level::DEBUG,
            include_target: true,
            ansi_colors: true,
        }
    }
}

/// Initialize logging with the given configuration
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level)
        .with_ansi(config.ansi_colors)
        .with_target(config.include_target)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| KittiSegError::Config(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

/// Scalar metrics for one epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub train_loss: f64,
    pub val_loss: f64,
    pub lr: f64,
}

/// Per-run metrics history, serialized to JSON in the output directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsHistory {
    pub epochs: Vec<EpochMetrics>,
}

impl MetricsHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the scalar signals for one epoch and emit them to the log
    pub fn record(&mut self, epoch: usize, train_loss: f64, val_loss: f64, lr: f64) {
        tracing::info!(epoch, train_loss, val_loss, lr, "epoch complete");
        self.epochs.push(EpochMetrics {
            epoch,
            train_loss,
            val_loss,
            lr,
        });
    }

    /// Best (lowest) validation loss seen so far
    pub fn best_val_loss(&self) -> Option<f64> {
        self.epochs
            .iter()
            .map(|m| m.val_loss)
            .fold(None, |best, v| match best {
                Some(b) if b <= v => Some(b),
                _ => Some(v),
            })
    }

    /// Save the history as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| KittiSegError::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a previously saved history
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| KittiSegError::Serialization(e.to_string()))
    }
}

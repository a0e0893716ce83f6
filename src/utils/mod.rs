//! Logging, metrics and error utilities

pub mod error;
pub mod logging;

pub use error::{KittiSegError, Result};
pub use logging::{init_logging, LogConfig, MetricsHistory};

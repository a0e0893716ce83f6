//! Error Handling Module
//!
//! Defines custom error types for the KITTI segmentation library.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for KITTI segmentation operations
#[derive(Error, Debug)]
pub enum KittiSegError {
    /// Configuration error, fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Error with dataset operations
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Image and mask directories disagree on the number of files
    #[error("Image/mask count mismatch: {images} images but {masks} masks")]
    CountMismatch { images: usize, masks: usize },

    /// Error loading or decoding an image or mask file
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// Invalid label space definition
    #[error("Label space error: {0}")]
    LabelSpace(String),

    /// Error during training
    #[error("Training error: {0}")]
    Training(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Convenience Result type for KITTI segmentation operations
pub type Result<T> = std::result::Result<T, KittiSegError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KittiSegError::Dataset("test error".to_string());
        assert_eq!(format!("{}", err), "Dataset error: test error");
    }

    #[test]
    fn test_count_mismatch_display() {
        let err = KittiSegError::CountMismatch {
            images: 200,
            masks: 199,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("200"));
        assert!(msg.contains("199"));
    }

    #[test]
    fn test_image_load_error() {
        let path = PathBuf::from("/path/to/image.png");
        let err = KittiSegError::ImageLoad(path, "file not found".to_string());
        assert!(format!("{}", err).contains("image.png"));
    }
}

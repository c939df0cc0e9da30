//! Error types for stack cropping operations

use thiserror::Error;

/// Main error type for cropping and serialization operations
#[derive(Error, Debug)]
pub enum CropError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported rank {rank} in {stage}: only 3D and 4D stacks are handled")]
    UnsupportedRank { stage: &'static str, rank: usize },

    #[error("crop exceeds volume extent: {0}")]
    CropTooLarge(String),

    #[error("volume depth {depth} is below the required window of {required} slices")]
    InsufficientDepth { depth: usize, required: usize },

    #[error("TIFF decode error: {0}")]
    Decode(String),

    #[error("TIFF encode error: {0}")]
    Encode(String),

    #[error("metadata error: {0}")]
    Metadata(String),

    #[error("shape error: {0}")]
    Shape(String),
}

/// Specialized Result type for cropping operations
pub type Result<T> = std::result::Result<T, CropError>;

impl From<serde_json::Error> for CropError {
    fn from(err: serde_json::Error) -> Self {
        CropError::Metadata(err.to_string())
    }
}

impl From<ndarray::ShapeError> for CropError {
    fn from(err: ndarray::ShapeError) -> Self {
        CropError::Shape(err.to_string())
    }
}

use thiserror::Error;

/// Errors surfaced by the extractor.
///
/// Only construction-time configuration problems and process-time dimension
/// mismatches are errors; a frame with no detectable planes is not (it yields
/// an all-zero label image).
#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unknown configuration key `{0}`")]
    UnknownConfigKey(String),
    #[error("invalid value `{value}` for configuration key `{key}`")]
    InvalidConfigValue { key: String, value: String },
    #[error("image {height}x{width} holds no complete cell of patch size {patch_size}")]
    ImageTooSmall {
        height: usize,
        width: usize,
        patch_size: usize,
    },
    #[error("point cloud has {actual} points, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("failed to decode depth image: {0}")]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

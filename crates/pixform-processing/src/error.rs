/// Errors produced by the transform services
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("At least one dimension (width or height) must be provided")]
    InvalidDimensions,

    #[error("Quality must be between 1 and 100 (got {0})")]
    InvalidQuality(i32),

    #[error("Error converting image: {0}")]
    Conversion(String),

    #[error("Error resizing image: {0}")]
    Resize(String),

    #[error("Error compressing image: {0}")]
    Compression(String),

    #[error("Transform worker failed: {0}")]
    Worker(String),
}

impl TransformError {
    /// Whether the error was caused by the caller's parameters rather than the codec
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TransformError::UnsupportedFormat(_)
                | TransformError::InvalidDimensions
                | TransformError::InvalidQuality(_)
        )
    }
}

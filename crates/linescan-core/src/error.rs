use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinescanError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: expected {expected_width}x{expected_height}, found {width}x{height}")]
    DimensionMismatch {
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },

    #[error("Frame count mismatch: {0}")]
    FrameCountMismatch(String),

    #[error("Line detection failed: {0}")]
    DetectionFailed(String),

    #[error("Division by zero: {0}")]
    DivideByZero(String),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("TIFF error: {0}")]
    TiffError(#[from] tiff::TiffError),

    #[error("Empty frame sequence")]
    EmptySequence,
}

pub type Result<T> = std::result::Result<T, LinescanError>;

use ndarray::Array2;

use crate::error::{LinescanError, Result};

/// A single grayscale frame of a scan sequence.
/// Pixel values are raw sensor counts as f32 (not normalized).
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<f32>,
    /// Original bit depth before conversion (8, 16 or 32)
    pub original_bit_depth: u8,
    pub metadata: FrameMetadata,
}

impl Frame {
    pub fn new(data: Array2<f32>, bit_depth: u8) -> Self {
        Self {
            data,
            original_bit_depth: bit_depth,
            metadata: FrameMetadata::default(),
        }
    }

    pub fn with_index(mut self, frame_index: usize) -> Self {
        self.metadata.frame_index = frame_index;
        self
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Shape as `(height, width)`.
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }
}

#[derive(Clone, Debug, Default)]
pub struct FrameMetadata {
    /// Position of the frame within its stack.
    pub frame_index: usize,
}

/// Check that all frames share the dimensions of the first one.
///
/// Returns the common `(height, width)`.
pub fn uniform_dim(frames: &[Frame]) -> Result<(usize, usize)> {
    let first = frames.first().ok_or(LinescanError::EmptySequence)?;
    let (h, w) = first.dim();
    for frame in &frames[1..] {
        let (fh, fw) = frame.dim();
        if fh != h || fw != w {
            return Err(LinescanError::DimensionMismatch {
                expected_width: w,
                expected_height: h,
                width: fw,
                height: fh,
            });
        }
    }
    Ok((h, w))
}

/// Subtract the camera black level from every pixel of every frame.
pub fn subtract_black_level(frames: &mut [Frame], black_level: f32) {
    for frame in frames.iter_mut() {
        frame.data.mapv_inplace(|v| v - black_level);
    }
}

use ndarray::Array2;

use crate::error::{LinescanError, Result};
use crate::frame::Frame;

/// Multiply every frame by its calibration factor map.
pub fn apply_calibration(frames: &[Frame], factors: &[Array2<f32>]) -> Result<Vec<Frame>> {
    if frames.is_empty() {
        return Err(LinescanError::EmptySequence);
    }
    if frames.len() != factors.len() {
        return Err(LinescanError::FrameCountMismatch(format!(
            "{} frames but {} calibration maps",
            frames.len(),
            factors.len()
        )));
    }

    frames
        .iter()
        .zip(factors)
        .map(|(frame, factor)| {
            let (h, w) = frame.dim();
            let (fh, fw) = factor.dim();
            if h != fh || w != fw {
                return Err(LinescanError::DimensionMismatch {
                    expected_width: w,
                    expected_height: h,
                    width: fw,
                    height: fh,
                });
            }
            Ok(Frame {
                data: &frame.data * factor,
                original_bit_depth: frame.original_bit_depth,
                metadata: frame.metadata.clone(),
            })
        })
        .collect()
}

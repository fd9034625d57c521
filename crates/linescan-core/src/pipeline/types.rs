use ndarray::Array2;

use crate::calibrate::Calibration;
use crate::frame::Frame;
use crate::geometry::LineFamily;
use crate::mask::Subtraction;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Reading,
    LineFitting,
    Calibrating,
    ApplyingCalibration,
    Subtracting,
    Writing,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reading => write!(f, "Reading frames"),
            Self::LineFitting => write!(f, "Fitting lines"),
            Self::Calibrating => write!(f, "Estimating calibration"),
            Self::ApplyingCalibration => write!(f, "Applying calibration"),
            Self::Subtracting => write!(f, "Subtracting background"),
            Self::Writing => write!(f, "Writing output"),
        }
    }
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage (e.g., scan directions), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// Progress reporter that ignores every event.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Calibration of a whole stack, one entry per scan direction.
#[derive(Clone, Debug)]
pub struct CalibrationOutput {
    pub families: Vec<LineFamily>,
    pub calibrations: Vec<Calibration>,
}

impl CalibrationOutput {
    /// Factor maps of every direction, in stack order.
    pub fn factor_frames(&self) -> Vec<Frame> {
        self.calibrations
            .iter()
            .flat_map(|c| c.factors.iter())
            .enumerate()
            .map(|(i, f)| Frame::new(f.clone(), 32).with_index(i))
            .collect()
    }
}

/// Background subtraction of a whole stack, one entry per scan direction.
#[derive(Clone, Debug)]
pub struct SubtractionOutput {
    pub families: Vec<LineFamily>,
    pub directions: Vec<Subtraction>,
    /// Sum of the per-direction results.
    pub composite: Array2<f32>,
}

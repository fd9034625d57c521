pub mod config;
mod orchestrator;
mod types;

pub use config::{LineSource, PipelineConfig};
pub use orchestrator::{
    family_from_picker, resolve_family, run_apply_calibration, run_calibration, run_subtraction, run_subtraction_cached,
    split_directions,
};
pub use types::{
    CalibrationOutput, NoOpReporter, PipelineStage, ProgressReporter, SubtractionOutput,
};

pub mod apply;
pub mod estimator;

pub use apply::apply_calibration;
pub use estimator::{estimate_calibration, Calibration, CalibrationConfig};

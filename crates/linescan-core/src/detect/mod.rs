pub mod lines;
pub mod spectrum;
mod subpixel;

pub use lines::{detect_lines, detect_lines_in_frame, DetectionConfig};

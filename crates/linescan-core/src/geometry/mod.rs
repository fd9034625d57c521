pub mod field;
pub mod line;
pub mod point;

pub use field::{distance_map, line_index_map, line_overlay, pixel_map};
pub use line::{symmetric_remainder, Line, LineFamily, ShiftDirection};
pub use point::{parse_points, parse_three_points, FixedPoints, Point, PointPicker};

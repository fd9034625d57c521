use std::io::Write;
use std::sync::{Arc, Mutex};

use linescan_core::frame::Frame;
use linescan_core::geometry::{pixel_map, LineFamily, ShiftDirection};
use ndarray::Array2;

/// Image of `family` where each pixel is `profile(distance to nearest line)`.
pub fn line_pattern(
    family: &LineFamily,
    dim: (usize, usize),
    profile: impl Fn(f64) -> f32 + Sync,
) -> Array2<f32> {
    pixel_map(dim, |p| profile(family.point_distance(p)))
}

/// Gaussian line profile with the given peak and width.
pub fn gaussian(peak: f32, width: f64) -> impl Fn(f64) -> f32 + Sync {
    move |d| peak * (-(d / width).powi(2)).exp() as f32
}

/// Scan sequence in which frame `i` sees `family` at step `i` of `gains.len()`.
///
/// Every pixel takes `gains[i] * line_gain(k)`, `k` being the index of its
/// nearest line in the shifted family.
pub fn flat_line_sequence(
    family: &LineFamily,
    dim: (usize, usize),
    direction: ShiftDirection,
    gains: &[f32],
    line_gain: impl Fn(i64) -> f32 + Sync,
) -> Vec<Frame> {
    let total = gains.len();
    gains
        .iter()
        .enumerate()
        .map(|(i, &gain)| {
            let shifted = family.shifted(i, total, direction).unwrap();
            let data = pixel_map(dim, |p| gain * line_gain(shifted.line_index(p)));
            Frame::new(data, 16).with_index(i)
        })
        .collect()
}

/// Alternating line brightness, 100 for even and 120 for odd line indices.
pub fn alternating(k: i64) -> f32 {
    100.0 * (1.0 + 0.2 * k.rem_euclid(2) as f32)
}

pub fn uniform_frames(values: &[f32], dim: (usize, usize)) -> Vec<Frame> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| Frame::new(Array2::from_elem(dim, v), 16).with_index(i))
        .collect()
}

/// Angle difference folded into `[0, pi/2]`, for orientations defined mod pi.
pub fn orientation_error(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(std::f64::consts::PI);
    d.min(std::f64::consts::PI - d)
}

/// Run `f` under a subscriber that records warnings, returning its result and
/// the formatted log lines.
pub fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let sink = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || SharedBuffer(sink.clone()))
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.lock().unwrap()).into_owned();
    (result, logs)
}

struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

use std::collections::BTreeMap;

use ndarray::{s, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::consts::{DEFAULT_MEAN_ROI_SIZE, DEFAULT_NOISE_FLOOR, PARALLEL_FRAME_THRESHOLD};
use crate::error::{LinescanError, Result};
use crate::frame::{uniform_dim, Frame};
use crate::geometry::{line_index_map, LineFamily, ShiftDirection};

/// Parameters for flat-field factor estimation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Pixels at or below this value (after black-level subtraction) are
    /// treated as background and ignored.
    pub noise_floor: f32,
    /// Side length of the centred window used for per-frame means.
    pub roi_size: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            noise_floor: DEFAULT_NOISE_FLOOR,
            roi_size: DEFAULT_MEAN_ROI_SIZE,
        }
    }
}

/// Flat-field calibration of one scan sequence.
#[derive(Clone, Debug)]
pub struct Calibration {
    /// Per-frame multiplicative factor maps.
    pub factors: Vec<Array2<f32>>,
    /// Foreground mean of each frame inside the mean window.
    pub frame_means: Vec<f64>,
    /// Frame-normalized mean brightness per line index.
    pub line_means: BTreeMap<i64, f64>,
}

#[derive(Clone, Copy, Debug, Default)]
struct BucketSum {
    sum: f64,
    count: u64,
}

struct FrameStatistics {
    mean: f64,
    buckets: BTreeMap<i64, BucketSum>,
}

/// Estimate per-frame flat-field factors for a black-level-subtracted scan
/// sequence.
///
/// Frame `i` sees `family` shifted to step `i` of `frames.len()`. Pass one
/// collects the foreground mean of every frame and, per line index, the mean
/// of `value / frame_mean` over all frames. Pass two sets each pixel's factor
/// to `1 / (frame_mean * line_mean)` for the line it is nearest to.
pub fn estimate_calibration(
    frames: &[Frame],
    family: &LineFamily,
    direction: ShiftDirection,
    config: &CalibrationConfig,
) -> Result<Calibration> {
    let dim = uniform_dim(frames)?;
    let total = frames.len();
    info!(
        frames = total,
        width = dim.1,
        height = dim.0,
        %family,
        "Estimating calibration factors"
    );

    let statistics = map_frames(total, |i| {
        frame_statistics(&frames[i], family, i, total, direction, config)
    })?;

    let frame_means: Vec<f64> = statistics.iter().map(|s| s.mean).collect();
    let line_means = merge_line_means(&statistics)?;

    for (i, mean) in frame_means.iter().enumerate() {
        debug!(frame = i, mean, "Frame mean");
    }
    for (line, mean) in &line_means {
        debug!(line, mean, "Line mean");
    }

    let factors = map_frames(total, |i| {
        synthesize_factors(dim, family, i, total, direction, frame_means[i], &line_means)
    })?;

    info!(lines = line_means.len(), "Calibration factors computed");
    Ok(Calibration {
        factors,
        frame_means,
        line_means,
    })
}

/// Run `f` for every frame index, in parallel for longer sequences.
fn map_frames<T, F>(total: usize, f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> Result<T> + Sync + Send,
{
    if total >= PARALLEL_FRAME_THRESHOLD {
        (0..total).into_par_iter().map(&f).collect()
    } else {
        (0..total).map(&f).collect()
    }
}

fn frame_statistics(
    frame: &Frame,
    family: &LineFamily,
    index: usize,
    total: usize,
    direction: ShiftDirection,
    config: &CalibrationConfig,
) -> Result<FrameStatistics> {
    let shifted = family.shifted(index, total, direction)?;
    let lines = line_index_map(&shifted, frame.dim());

    let mean = foreground_roi_mean(&frame.data, config).ok_or_else(|| {
        LinescanError::DivideByZero(format!(
            "frame {index} has no foreground pixels in the mean window"
        ))
    })?;

    let mut buckets: BTreeMap<i64, BucketSum> = BTreeMap::new();
    for (&value, &line) in frame.data.iter().zip(lines.iter()) {
        if value > config.noise_floor {
            let bucket = buckets.entry(line).or_default();
            bucket.sum += value as f64 / mean;
            bucket.count += 1;
        }
    }

    Ok(FrameStatistics { mean, buckets })
}

/// Mean of the foreground pixels inside the centred mean window.
///
/// `None` when the window holds no foreground pixel or the mean is not
/// positive.
fn foreground_roi_mean(data: &Array2<f32>, config: &CalibrationConfig) -> Option<f64> {
    let (h, w) = data.dim();
    let (r0, r1) = centred_range(h, config.roi_size);
    let (c0, c1) = centred_range(w, config.roi_size);

    let mut sum = 0.0f64;
    let mut count = 0u64;
    for &value in data.slice(s![r0..r1, c0..c1]).iter() {
        if value > config.noise_floor {
            sum += value as f64;
            count += 1;
        }
    }

    let mean = sum / count as f64;
    (count > 0 && mean > 0.0).then_some(mean)
}

fn centred_range(len: usize, size: usize) -> (usize, usize) {
    let size = size.min(len);
    let start = (len - size) / 2;
    (start, start + size)
}

fn merge_line_means(statistics: &[FrameStatistics]) -> Result<BTreeMap<i64, f64>> {
    let mut totals: BTreeMap<i64, BucketSum> = BTreeMap::new();
    for frame in statistics {
        for (&line, bucket) in &frame.buckets {
            let total = totals.entry(line).or_default();
            total.sum += bucket.sum;
            total.count += bucket.count;
        }
    }

    totals
        .into_iter()
        .map(|(line, bucket)| {
            let mean = bucket.sum / bucket.count as f64;
            if mean.is_finite() && mean > 0.0 {
                Ok((line, mean))
            } else {
                Err(LinescanError::DivideByZero(format!(
                    "line {line} has mean intensity {mean}"
                )))
            }
        })
        .collect()
}

fn synthesize_factors(
    dim: (usize, usize),
    family: &LineFamily,
    index: usize,
    total: usize,
    direction: ShiftDirection,
    frame_mean: f64,
    line_means: &BTreeMap<i64, f64>,
) -> Result<Array2<f32>> {
    let shifted = family.shifted(index, total, direction)?;
    let lines = line_index_map(&shifted, dim);

    let mut factors = Array2::<f32>::zeros(dim);
    for (factor, line) in factors.iter_mut().zip(lines.iter()) {
        let line_mean = line_means.get(line).ok_or_else(|| {
            LinescanError::DivideByZero(format!(
                "line {line} has no foreground samples in any frame (needed by frame {index})"
            ))
        })?;
        *factor = (1.0 / (frame_mean * line_mean)) as f32;
    }
    Ok(factors)
}

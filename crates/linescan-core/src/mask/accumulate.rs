use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::consts::DEFAULT_SUBTRACTION_ALPHA;
use crate::error::{LinescanError, Result};
use crate::frame::{uniform_dim, Frame};
use crate::geometry::{LineFamily, ShiftDirection};

use super::masks::{MaskCache, MaskConfig};

/// How the on/off accumulators are combined into the result image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubtractionMode {
    /// `on - alpha * off`
    #[default]
    Confocal,
    /// On-line accumulation only.
    NoSubtract,
    /// Plain sum of normalized frames, masks ignored.
    Widefield,
}

impl std::fmt::Display for SubtractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confocal => write!(f, "Confocal"),
            Self::NoSubtract => write!(f, "No Subtract"),
            Self::Widefield => write!(f, "Widefield"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtractionConfig {
    pub mode: SubtractionMode,
    /// Strength of the off-line subtraction.
    pub alpha: f32,
}

impl Default for SubtractionConfig {
    fn default() -> Self {
        Self {
            mode: SubtractionMode::Confocal,
            alpha: DEFAULT_SUBTRACTION_ALPHA,
        }
    }
}

/// Output of a background subtraction run.
#[derive(Clone, Debug)]
pub struct Subtraction {
    pub result: Array2<f32>,
    /// On-line accumulator (the normalized frame sum in widefield mode).
    pub on: Array2<f32>,
    /// Off-line accumulator; absent in widefield mode.
    pub off: Option<Array2<f32>>,
    /// Per-frame brightness normalization factors.
    pub normalization: Vec<f64>,
}

/// Per-frame factors `mean_of_means / mean(frame)` that cancel global
/// brightness drift across a sequence.
pub fn normalization_factors(frames: &[Frame]) -> Result<Vec<f64>> {
    if frames.is_empty() {
        return Err(LinescanError::EmptySequence);
    }
    let means: Vec<f64> = frames
        .iter()
        .map(|f| f.data.iter().map(|&v| v as f64).sum::<f64>() / f.data.len().max(1) as f64)
        .collect();
    let mean_of_means = means.iter().sum::<f64>() / means.len() as f64;

    means
        .iter()
        .enumerate()
        .map(|(i, &mean)| {
            if mean == 0.0 || !mean.is_finite() {
                Err(LinescanError::DivideByZero(format!(
                    "frame {i} has mean intensity {mean}"
                )))
            } else {
                Ok(mean_of_means / mean)
            }
        })
        .collect()
}

/// Accumulate a scan sequence under its on/off masks and subtract the
/// out-of-focus background.
///
/// Frame `i` is weighted by the masks of `family` shifted to step `i` of
/// `frames.len()`, after normalization by [`normalization_factors`].
pub fn subtract_background(
    frames: &[Frame],
    family: &LineFamily,
    direction: ShiftDirection,
    masks: &MaskConfig,
    config: &SubtractionConfig,
) -> Result<Subtraction> {
    let mut cache = MaskCache::new(masks.clone())?;
    subtract_background_cached(frames, family, direction, config, &mut cache)
}

/// [`subtract_background`] drawing its masks from a cache shared across
/// the stacks of a run.
pub fn subtract_background_cached(
    frames: &[Frame],
    family: &LineFamily,
    direction: ShiftDirection,
    config: &SubtractionConfig,
    cache: &mut MaskCache,
) -> Result<Subtraction> {
    let dim = uniform_dim(frames)?;
    if !config.alpha.is_finite() {
        return Err(LinescanError::InvalidInput(format!(
            "subtraction strength must be finite, got {}",
            config.alpha
        )));
    }
    let normalization = normalization_factors(frames)?;
    info!(
        frames = frames.len(),
        mode = %config.mode,
        alpha = config.alpha,
        "Accumulating on/off signal"
    );

    let mut on = Array2::<f32>::zeros(dim);

    if config.mode == SubtractionMode::Widefield {
        for (frame, &norm) in frames.iter().zip(&normalization) {
            let norm = norm as f32;
            Zip::from(&mut on)
                .and(&frame.data)
                .for_each(|acc, &v| *acc += v * norm);
        }
        return Ok(Subtraction {
            result: on.clone(),
            on,
            off: None,
            normalization,
        });
    }

    let mut off = Array2::<f32>::zeros(dim);

    for (i, (frame, &norm)) in frames.iter().zip(&normalization).enumerate() {
        debug!(frame = i, normalization = norm, "Accumulating frame");
        let norm = norm as f32;
        let pair = cache.get(family, dim, frames.len(), direction, i)?;
        Zip::from(&mut on)
            .and(&mut off)
            .and(&pair.on)
            .and(&pair.off)
            .and(&frame.data)
            .for_each(|on_acc, off_acc, &on_w, &off_w, &v| {
                let value = v * norm;
                *on_acc += on_w * value;
                *off_acc += off_w * value;
            });
    }

    let result = match config.mode {
        SubtractionMode::NoSubtract => on.clone(),
        _ => {
            let alpha = config.alpha;
            Zip::from(&on).and(&off).map_collect(|&a, &b| a - alpha * b)
        }
    };

    Ok(Subtraction {
        result,
        on,
        off: Some(off),
        normalization,
    })
}

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_OFF_MASK_SCALE, DEFAULT_ON_MASK_WIDTH};
use crate::error::{LinescanError, Result};
use crate::geometry::{pixel_map, LineFamily, ShiftDirection};

/// Gaussian widths and weights of the on/off masks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// Width (pixels) of the on-line Gaussian.
    pub on_width: f32,
    /// Width (pixels) of the off-line Gaussian; twice `on_width` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub off_width: Option<f32>,
    /// Weight applied to the off-line mask.
    pub off_scale: f32,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            on_width: DEFAULT_ON_MASK_WIDTH,
            off_width: None,
            off_scale: DEFAULT_OFF_MASK_SCALE,
        }
    }
}

impl MaskConfig {
    pub fn off_width(&self) -> f32 {
        self.off_width.unwrap_or(2.0 * self.on_width)
    }

    fn validate(&self) -> Result<()> {
        check_width(self.on_width)?;
        check_width(self.off_width())?;
        if !self.off_scale.is_finite() {
            return Err(LinescanError::InvalidInput(format!(
                "off-mask scale must be finite, got {}",
                self.off_scale
            )));
        }
        Ok(())
    }
}

fn check_width(width: f32) -> Result<()> {
    if width.is_finite() && width > 0.0 {
        Ok(())
    } else {
        Err(LinescanError::InvalidInput(format!(
            "mask width must be positive, got {width}"
        )))
    }
}

/// On- and off-line weights for one frame.
#[derive(Clone, Debug)]
pub struct MaskPair {
    pub on: Array2<f32>,
    pub off: Array2<f32>,
}

/// Gaussian weight `exp(-(d / width)^2)` of the distance `d` to the nearest line.
pub fn on_mask(family: &LineFamily, dim: (usize, usize), width: f32) -> Result<Array2<f32>> {
    check_width(width)?;
    let width = width as f64;
    Ok(pixel_map(dim, |p| {
        let d = family.point_distance(p) / width;
        (-(d * d)).exp() as f32
    }))
}

/// On-mask of the family advanced by half a spacing, widened and down-weighted.
pub fn off_mask(family: &LineFamily, dim: (usize, usize), config: &MaskConfig) -> Result<Array2<f32>> {
    let between = family.shifted(1, 2, ShiftDirection::Forward)?;
    let mut mask = on_mask(&between, dim, config.off_width())?;
    mask.mapv_inplace(|v| v * config.off_scale);
    Ok(mask)
}

pub fn mask_pair(family: &LineFamily, dim: (usize, usize), config: &MaskConfig) -> Result<MaskPair> {
    Ok(MaskPair {
        on: on_mask(family, dim, config.on_width)?,
        off: off_mask(family, dim, config)?,
    })
}

/// One scan sequence's worth of masks: a family stepped across `total_steps`
/// positions on a frame of size `dim`.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SequenceKey {
    family: LineFamily,
    dim: (usize, usize),
    total_steps: usize,
    direction: ShiftDirection,
}

/// Lazily computed mask pairs, kept for every sequence seen during a run.
///
/// Stacks sharing a family, frame size and step count reuse the same pairs.
pub struct MaskCache {
    config: MaskConfig,
    sequences: Vec<(SequenceKey, Vec<Option<MaskPair>>)>,
    built: usize,
}

impl MaskCache {
    pub fn new(config: MaskConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            sequences: Vec::new(),
            built: 0,
        })
    }

    pub fn config(&self) -> &MaskConfig {
        &self.config
    }

    /// Number of cached mask pairs.
    pub fn len(&self) -> usize {
        self.sequences
            .iter()
            .map(|(_, pairs)| pairs.iter().filter(|p| p.is_some()).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of mask pairs computed so far; cache hits do not count.
    pub fn built(&self) -> usize {
        self.built
    }

    /// Mask pair of scan step `index` of a `total_steps` sequence of
    /// `family`, computed on first use.
    pub fn get(
        &mut self,
        family: &LineFamily,
        dim: (usize, usize),
        total_steps: usize,
        direction: ShiftDirection,
        index: usize,
    ) -> Result<&MaskPair> {
        if total_steps == 0 {
            return Err(LinescanError::InvalidInput(
                "number of scan steps must be positive".into(),
            ));
        }
        if index >= total_steps {
            return Err(LinescanError::FrameCountMismatch(format!(
                "mask for step {index} requested from a {total_steps}-step sequence"
            )));
        }
        let key = SequenceKey {
            family: *family,
            dim,
            total_steps,
            direction,
        };
        let slot = match self.sequences.iter().position(|(k, _)| *k == key) {
            Some(slot) => slot,
            None => {
                self.sequences.push((key, vec![None; total_steps]));
                self.sequences.len() - 1
            }
        };

        let pairs = &mut self.sequences[slot].1;
        let pair = match pairs[index].take() {
            Some(pair) => pair,
            None => {
                let shifted = family.shifted(index, total_steps, direction)?;
                let pair = mask_pair(&shifted, dim, &self.config)?;
                self.built += 1;
                pair
            }
        };
        Ok(pairs[index].insert(pair))
    }
}

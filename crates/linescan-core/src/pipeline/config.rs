use serde::{Deserialize, Serialize};

use crate::calibrate::CalibrationConfig;
use crate::consts::DEFAULT_LINES_PER_INTERVAL;
use crate::detect::DetectionConfig;
use crate::geometry::ShiftDirection;
use crate::mask::{MaskConfig, SubtractionConfig};

/// Full configuration of a correction run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Camera dark offset subtracted from every raw pixel.
    #[serde(default)]
    pub black_level: f32,
    /// Frames per scan direction; the whole stack split evenly when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps_per_direction: Option<usize>,
    /// One line source per scan direction, in stack order.
    #[serde(default = "default_directions")]
    pub directions: Vec<LineSource>,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub masks: MaskConfig,
    #[serde(default)]
    pub subtraction: SubtractionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            black_level: 0.0,
            steps_per_direction: None,
            directions: default_directions(),
            detection: DetectionConfig::default(),
            calibration: CalibrationConfig::default(),
            masks: MaskConfig::default(),
            subtraction: SubtractionConfig::default(),
        }
    }
}

fn default_directions() -> Vec<LineSource> {
    vec![LineSource::Detect {
        direction: ShiftDirection::Forward,
    }]
}

fn default_lines_per_interval() -> u32 {
    DEFAULT_LINES_PER_INTERVAL
}

/// Where the line family of one scan direction comes from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum LineSource {
    /// Three points `"x,y;x,y;x,y"`: two on one line, the third
    /// `lines_per_interval` spacings away.
    Points {
        points: String,
        #[serde(default = "default_lines_per_interval")]
        lines_per_interval: u32,
        #[serde(default)]
        direction: ShiftDirection,
    },
    /// Frequency-domain detection on the first frame of the direction.
    Detect {
        #[serde(default)]
        direction: ShiftDirection,
    },
}

impl LineSource {
    pub fn direction(&self) -> ShiftDirection {
        match self {
            Self::Points { direction, .. } | Self::Detect { direction } => *direction,
        }
    }
}

impl std::fmt::Display for LineSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Points {
                points,
                lines_per_interval,
                ..
            } => write!(f, "Points {points} ({lines_per_interval} lines)"),
            Self::Detect { .. } => write!(f, "Detect"),
        }
    }
}

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use linescan_core::frame::{subtract_black_level, Frame};
use linescan_core::geometry::ShiftDirection;
use linescan_core::io::read_stack;
use linescan_core::pipeline::{LineSource, PipelineConfig};

/// Options shared by the commands that run the correction pipeline.
#[derive(Args)]
pub struct PipelineArgs {
    /// Pipeline config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Three points "x,y;x,y;x,y" defining the line family (detected when omitted)
    #[arg(long)]
    pub points: Option<String>,

    /// Line spacings between the first line and the third point
    #[arg(long, default_value = "10")]
    pub lines_per_interval: u32,

    /// Lines move against the normal direction from frame to frame
    #[arg(long)]
    pub reverse: bool,

    /// Frames per scan direction (the whole stack when omitted)
    #[arg(long)]
    pub steps: Option<usize>,

    /// Camera black level subtracted from every pixel
    #[arg(long)]
    pub black_level: Option<f32>,
}

impl PipelineArgs {
    /// Load the config file, if any, and apply command-line overrides.
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        if self.reverse && self.config.is_some() && self.points.is_none() {
            bail!(
                "--reverse only applies to --points; set `direction` for each scan direction \
                 in the config file instead"
            );
        }
        let mut config = match self.config {
            Some(ref path) => load_config(path)?,
            None => PipelineConfig::default(),
        };

        let direction = if self.reverse {
            ShiftDirection::Reverse
        } else {
            ShiftDirection::Forward
        };
        if let Some(ref points) = self.points {
            config.directions = vec![LineSource::Points {
                points: points.clone(),
                lines_per_interval: self.lines_per_interval,
                direction,
            }];
        } else if self.config.is_none() {
            config.directions = vec![LineSource::Detect { direction }];
        }
        if self.steps.is_some() {
            config.steps_per_direction = self.steps;
        }
        if let Some(black_level) = self.black_level {
            config.black_level = black_level;
        }
        Ok(config)
    }
}

pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&contents).context("Invalid pipeline config")
}

/// Read a stack and subtract the black level from every frame.
pub fn read_frames(path: &Path, black_level: f32) -> Result<Vec<Frame>> {
    let mut frames =
        read_stack(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if frames.is_empty() {
        bail!("{} contains no frames", path.display());
    }
    subtract_black_level(&mut frames, black_level);
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> PipelineArgs {
        PipelineArgs {
            config: None,
            points: None,
            lines_per_interval: 10,
            reverse: false,
            steps: None,
            black_level: None,
        }
    }

    #[test]
    fn test_reverse_with_config_requires_points() {
        let args = PipelineArgs {
            config: Some(PathBuf::from("scan.toml")),
            reverse: true,
            ..args()
        };
        let err = args.pipeline_config().unwrap_err();
        assert!(err.to_string().contains("--reverse"));
    }

    #[test]
    fn test_reverse_applies_to_points() {
        let args = PipelineArgs {
            points: Some("0,0;0,100;80,0".into()),
            reverse: true,
            ..args()
        };
        let config = args.pipeline_config().unwrap();
        assert_eq!(config.directions.len(), 1);
        assert_eq!(config.directions[0].direction(), ShiftDirection::Reverse);
    }

    #[test]
    fn test_reverse_applies_to_detection_without_config() {
        let args = PipelineArgs {
            reverse: true,
            ..args()
        };
        let config = args.pipeline_config().unwrap();
        assert_eq!(config.directions, vec![LineSource::Detect {
            direction: ShiftDirection::Reverse
        }]);
    }
}

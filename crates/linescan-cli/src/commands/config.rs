use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use linescan_core::geometry::ShiftDirection;
use linescan_core::pipeline::{LineSource, PipelineConfig};

#[derive(Args)]
pub struct ConfigArgs {
    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Include a second, hand-picked scan direction as an example
    #[arg(long)]
    pub two_directions: bool,
}

/// Print or save a full default PipelineConfig as TOML.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let mut config = PipelineConfig::default();
    if args.two_directions {
        config.directions.push(LineSource::Points {
            points: "0,0;0,100;80,0".into(),
            lines_per_interval: 10,
            direction: ShiftDirection::Reverse,
        });
    }
    let toml_str = toml::to_string_pretty(&config)?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Default config saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}

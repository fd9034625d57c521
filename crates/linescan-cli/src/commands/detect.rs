use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use linescan_core::consts::DEFAULT_OVERLAY_HALF_WIDTH;
use linescan_core::detect::detect_lines_in_frame;
use linescan_core::io::save_image;
use linescan_core::pipeline::PipelineConfig;

use super::common::load_config;
use super::lines::{draw_overlay, select_frame};
use crate::summary::print_family;

#[derive(Args)]
pub struct DetectArgs {
    /// Input image stack
    pub file: PathBuf,

    /// Frame of the stack to analyse
    #[arg(long, default_value = "0")]
    pub frame: usize,

    /// Pipeline config file (TOML); only the detection section is used
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the detected lines drawn over the frame
    #[arg(long)]
    pub overlay: Option<PathBuf>,
}

pub fn run(args: &DetectArgs) -> Result<()> {
    let config = match args.config {
        Some(ref path) => load_config(path)?,
        None => PipelineConfig::default(),
    };
    let frame = select_frame(&args.file, args.frame)?;
    println!(
        "Detecting lines in frame {} of {} ({}x{})",
        args.frame,
        args.file.display(),
        frame.width(),
        frame.height()
    );

    let family = detect_lines_in_frame(&frame, &config.detection)?;
    print_family(&family);

    if let Some(ref path) = args.overlay {
        let overlay = draw_overlay(&family, &frame, DEFAULT_OVERLAY_HALF_WIDTH);
        save_image(&overlay, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Overlay saved to {}", path.display());
    }
    Ok(())
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use linescan_core::io::{read_stack, write_stack};
use linescan_core::pipeline::{run_apply_calibration, PipelineStage, ProgressReporter};

use super::common::read_frames;
use crate::progress::BarReporter;

#[derive(Args)]
pub struct ApplyArgs {
    /// Input scan stack
    pub file: PathBuf,

    /// Factor stack written by `calibrate`
    #[arg(long)]
    pub factors: PathBuf,

    /// Camera black level subtracted before applying the factors
    #[arg(long, default_value = "0")]
    pub black_level: f32,

    /// Output file path
    #[arg(short, long, default_value = "calibrated.tiff")]
    pub output: PathBuf,
}

pub fn run(args: &ApplyArgs) -> Result<()> {
    let reporter = BarReporter::new()?;
    reporter.begin_stage(PipelineStage::Reading, None);
    let frames = read_frames(&args.file, args.black_level)?;
    let factors = read_stack(&args.factors)
        .with_context(|| format!("Failed to read {}", args.factors.display()))?;
    reporter.finish_stage();

    let factor_maps: Vec<_> = factors.into_iter().map(|f| f.data).collect();
    let calibrated = run_apply_calibration(&frames, &factor_maps, &reporter)?;

    reporter.begin_stage(PipelineStage::Writing, None);
    write_stack(&args.output, &calibrated)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    reporter.finish();

    println!(
        "Applied {} factor frames to {} frames",
        factor_maps.len(),
        frames.len()
    );
    println!("Saved to {}", args.output.display());
    Ok(())
}

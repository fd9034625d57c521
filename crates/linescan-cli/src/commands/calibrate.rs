use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use linescan_core::io::write_stack;
use linescan_core::pipeline::{run_calibration, PipelineStage, ProgressReporter};

use super::common::{read_frames, PipelineArgs};
use crate::progress::BarReporter;
use crate::summary::{print_calibration_summary, print_pipeline_summary};

#[derive(Args)]
pub struct CalibrateArgs {
    /// Input scan stack (multi-page TIFF)
    pub file: PathBuf,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Output factor stack
    #[arg(short, long, default_value = "factors.tiff")]
    pub output: PathBuf,
}

pub fn run(args: &CalibrateArgs) -> Result<()> {
    let config = args.pipeline.pipeline_config()?;
    print_pipeline_summary("Calibration", &args.file, &args.output, &config);

    let reporter = BarReporter::new()?;
    reporter.begin_stage(PipelineStage::Reading, None);
    let frames = read_frames(&args.file, config.black_level)?;
    reporter.finish_stage();

    let output = run_calibration(&frames, &config, &reporter)?;

    reporter.begin_stage(PipelineStage::Writing, None);
    let factors = output.factor_frames();
    write_stack(&args.output, &factors)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    reporter.finish();

    println!();
    print_calibration_summary(&output);
    println!(
        "{} factor frames saved to {}",
        factors.len(),
        args.output.display()
    );
    Ok(())
}

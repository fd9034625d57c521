use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use linescan_core::frame::Frame;
use linescan_core::io::save_image;
use linescan_core::mask::{MaskCache, SubtractionMode};
use linescan_core::pipeline::{
    run_subtraction_cached, PipelineConfig, PipelineStage, ProgressReporter,
};
use tracing::{debug, error};

use super::common::{read_frames, PipelineArgs};
use crate::progress::BarReporter;
use crate::summary::{print_pipeline_summary, print_subtraction_summary};

#[derive(Args)]
pub struct SubtractArgs {
    /// Input scan stacks
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Strength of the off-line subtraction
    #[arg(long)]
    pub alpha: Option<f32>,

    /// Sum the normalized frames without masking
    #[arg(long, conflicts_with = "no_subtract")]
    pub widefield: bool,

    /// Keep the on-line signal without subtracting the background
    #[arg(long)]
    pub no_subtract: bool,

    /// Also write an 8-bit PNG preview of each result
    #[arg(long)]
    pub preview: bool,

    /// Directory for the results
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

pub fn run(args: &SubtractArgs) -> Result<()> {
    let mut config = args.pipeline.pipeline_config()?;
    if let Some(alpha) = args.alpha {
        config.subtraction.alpha = alpha;
    }
    if args.widefield {
        config.subtraction.mode = SubtractionMode::Widefield;
    } else if args.no_subtract {
        config.subtraction.mode = SubtractionMode::NoSubtract;
    }
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    let mut cache = MaskCache::new(config.masks.clone())?;
    let mut failed = 0usize;
    for file in &args.files {
        let output = output_path(&args.output_dir, file, "tiff");
        print_pipeline_summary("Background Subtraction", file, &output, &config);
        if let Err(e) = process_file(file, &output, &config, &mut cache, args.preview) {
            error!(input = %file.display(), "Skipping input: {e:#}");
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{failed} of {} inputs failed", args.files.len());
    }
    Ok(())
}

fn process_file(
    input: &Path,
    output: &Path,
    config: &PipelineConfig,
    cache: &mut MaskCache,
    preview: bool,
) -> Result<()> {
    let reporter = BarReporter::new()?;
    reporter.begin_stage(PipelineStage::Reading, None);
    let frames = read_frames(input, config.black_level)?;
    reporter.finish_stage();

    let built_before = cache.built();
    let result = run_subtraction_cached(&frames, config, cache, &reporter)?;
    debug!(
        built = cache.built() - built_before,
        cached = cache.len(),
        "Mask pairs for this input"
    );

    reporter.begin_stage(PipelineStage::Writing, None);
    let composite = Frame::new(result.composite.clone(), 32);
    save_image(&composite, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    if preview {
        let png = output.with_extension("png");
        save_image(&composite, &png)
            .with_context(|| format!("Failed to write {}", png.display()))?;
    }
    reporter.finish();

    println!();
    print_subtraction_summary(config, &result);
    println!("Saved to {}", output.display());
    Ok(())
}

fn output_path(dir: &Path, input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "result".into());
    dir.join(format!("{stem}_subtracted.{extension}"))
}
